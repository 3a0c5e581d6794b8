//! Public API handlers.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::MultipartError;

use crate::application::ingest::{NewUpload, ResizeOutcome};
use crate::infra::storage::StorageError;

use super::GalleryState;
use super::error::ApiError;
use super::models::{
    CommentForm, CommentsQuery, CommentsResponse, GalleryQuery, GalleryResponse, MutationResponse,
    UploadResponse, VoteForm,
};

pub async fn get_images(
    State(state): State<GalleryState>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let listing = state.gallery.list(page).await?;

    Ok(Json(GalleryResponse {
        success: true,
        images: listing.entries,
        total: listing.total,
        page: listing.page,
        per_page: listing.per_page,
    }))
}

pub async fn upload(
    State(state): State<GalleryState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<(String, String, bytes::Bytes)> = None;
    let mut title = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("image") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "image".to_string());
                let declared_mime = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((original_name, declared_mime, bytes));
            }
            Some("title") => {
                title = non_empty(field.text().await.map_err(multipart_error)?);
            }
            Some("description") => {
                description = non_empty(field.text().await.map_err(multipart_error)?);
            }
            _ => continue,
        }
    }

    let (original_name, declared_mime, bytes) =
        file.ok_or_else(|| ApiError::bad_request("no image file in the upload"))?;

    let outcome = state
        .ingest
        .ingest(NewUpload {
            bytes,
            declared_mime,
            original_name,
            title,
            description,
        })
        .await?;

    let message = match outcome.resize {
        ResizeOutcome::Resized { .. } => "Image uploaded and resized",
        ResizeOutcome::Skipped => "Image uploaded",
        ResizeOutcome::Failed => "Image uploaded at its original resolution",
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            message: message.to_string(),
            image_id: outcome.image_id,
        }),
    ))
}

pub async fn vote(
    State(state): State<GalleryState>,
    headers: HeaderMap,
    Form(form): Form<VoteForm>,
) -> Result<Json<MutationResponse>, ApiError> {
    let voter = client_label(&headers);
    state
        .engagement
        .add_vote(form.image_id, form.value, voter)
        .await?;

    Ok(Json(MutationResponse {
        success: true,
        message: "Vote recorded".to_string(),
    }))
}

pub async fn comment(
    State(state): State<GalleryState>,
    Form(form): Form<CommentForm>,
) -> Result<Json<MutationResponse>, ApiError> {
    state
        .engagement
        .add_comment(form.image_id, form.author.as_deref(), &form.content)
        .await?;

    Ok(Json(MutationResponse {
        success: true,
        message: "Comment added".to_string(),
    }))
}

pub async fn get_comments(
    State(state): State<GalleryState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let comments = state.engagement.comments(query.image_id).await?;

    Ok(Json(CommentsResponse {
        success: true,
        comments,
    }))
}

pub async fn serve_content(
    State(state): State<GalleryState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = match state.storage.read(&filename).await {
        Ok(bytes) => bytes,
        Err(StorageError::InvalidName) => {
            return Err(ApiError::bad_request("invalid filename"));
        }
        Err(StorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("no such file"));
        }
        Err(err) => {
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
            ));
        }
    };

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes))
}

pub async fn health(State(state): State<GalleryState>) -> StatusCode {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "upload exceeds the request size limit",
        )
    } else {
        ApiError::bad_request("invalid multipart payload")
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Best-effort client label for the vote record: the first hop of
/// `X-Forwarded-For` when a proxy provides one.
fn client_label(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
