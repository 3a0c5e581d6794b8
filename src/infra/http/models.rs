//! Serialized request and response bodies for the public API.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{CommentRecord, GalleryEntry};

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub image_id: i64,
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub image_id: i64,
    pub author: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub image_id: i64,
}

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub success: bool,
    pub images: Vec<GalleryEntry>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub image_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub success: bool,
    pub comments: Vec<CommentRecord>,
}
