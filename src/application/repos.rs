//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CommentRecord, GalleryEntry};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("referenced image does not exist")]
    MissingParent,
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Insert parameters for a freshly ingested image.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub filename: String,
    pub filepath: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub image_id: i64,
    pub value: i64,
    pub voter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub image_id: i64,
    pub author: String,
    pub content: String,
}

#[async_trait]
pub trait ImagesRepo: Send + Sync {
    /// Insert the metadata row for a stored image and return its id.
    async fn insert_image(&self, image: NewImage) -> Result<i64, RepoError>;

    /// One page of the aggregated gallery listing, newest first.
    async fn list_gallery(&self, limit: u32, offset: u32) -> Result<Vec<GalleryEntry>, RepoError>;

    /// Total image count, independent of pagination.
    async fn count_images(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait EngagementRepo: Send + Sync {
    async fn insert_vote(&self, vote: NewVote) -> Result<(), RepoError>;

    async fn insert_comment(&self, comment: NewComment) -> Result<i64, RepoError>;

    /// Comments for one image, newest first.
    async fn list_comments(&self, image_id: i64) -> Result<Vec<CommentRecord>, RepoError>;
}
