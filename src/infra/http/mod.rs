//! The public HTTP surface: routing, request models, error mapping.

mod error;
mod handlers;
mod models;

pub use error::ApiError;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::application::{
    engagement::EngagementService, gallery::GalleryService, ingest::IngestService,
};
use crate::infra::{db::SqliteRepositories, storage::ContentStorage};

/// Allowance on top of the image ceiling for multipart framing and the
/// title/description fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

#[derive(Clone)]
pub struct GalleryState {
    pub ingest: Arc<IngestService>,
    pub gallery: Arc<GalleryService>,
    pub engagement: Arc<EngagementService>,
    pub storage: Arc<ContentStorage>,
    pub db: Arc<SqliteRepositories>,
}

pub fn build_router(state: GalleryState, max_upload_bytes: u64) -> Router {
    let body_limit = usize::try_from(max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);

    Router::new()
        .route("/api/images", get(handlers::get_images))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/vote", post(handlers::vote))
        .route("/api/comment", post(handlers::comment))
        .route("/api/comments", get(handlers::get_comments))
        .route("/content/{filename}", get(handlers::serve_content))
        .route("/healthz", get(handlers::health))
        .with_state(state)
}
