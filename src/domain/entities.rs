//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

/// A gallery listing row: image fields enriched with vote and comment
/// tallies computed at query time.
///
/// `filepath` is always derived as `content/<filename>`, never taken
/// from user input. `average_rating` is `None` when the image has no
/// votes; it is never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryEntry {
    pub id: i64,
    pub filename: String,
    pub filepath: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub upload_date: OffsetDateTime,
    pub vote_count: i64,
    pub average_rating: Option<f64>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: i64,
    pub image_id: i64,
    pub author: String,
    pub content: String,
    pub comment_date: OffsetDateTime,
}
