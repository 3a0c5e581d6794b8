//! API failures. Every error body is `{"success": false, "message": …}`
//! with a status that names the failure class; nothing is swallowed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::application::{engagement::EngagementError, ingest::IngestError, repos::RepoError};

const SOURCE: &str = "cornice::http";

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    success: bool,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(
                target = SOURCE,
                status = self.status.as_u16(),
                message = %self.message,
                "request failed"
            );
        }

        (
            self.status,
            Json(ApiErrorBody {
                success: false,
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            IngestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::CorruptImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Persistence(RepoError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Storage(_) | IngestError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<EngagementError> for ApiError {
    fn from(err: EngagementError) -> Self {
        let status = match &err {
            EngagementError::Validation(_) => StatusCode::BAD_REQUEST,
            EngagementError::UnknownImage => StatusCode::NOT_FOUND,
            EngagementError::Repo(RepoError::Timeout) => StatusCode::SERVICE_UNAVAILABLE,
            EngagementError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        let status = match &err {
            RepoError::NotFound => StatusCode::NOT_FOUND,
            RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}
