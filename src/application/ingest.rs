//! The upload-to-persisted-record pipeline.
//!
//! Order of operations matters here: the raw bytes are written to the
//! content directory *before* the stream is proven decodable, and a
//! failed probe does not remove the stored file. A crash or decode
//! failure can therefore orphan a file without a metadata row; the
//! reverse (a row without a file) cannot happen.

use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::imaging::{self, ImagingError, ProbedImage, StoredFormat};
use crate::application::repos::{ImagesRepo, NewImage, RepoError};
use crate::infra::storage::{ContentStorage, StorageError, StoredFile};

const SOURCE: &str = "cornice::ingest";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported format `{declared}`: only JPEG, PNG, GIF and WEBP are accepted")]
    UnsupportedFormat { declared: String },
    #[error("file exceeds the upload ceiling of {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: u64 },
    #[error("file is not a decodable image: {0}")]
    CorruptImage(String),
    #[error("failed to store the uploaded file")]
    Storage(#[source] StorageError),
    #[error("failed to record image metadata")]
    Persistence(#[source] RepoError),
}

/// An upload as handed over by the HTTP layer.
#[derive(Debug)]
pub struct NewUpload {
    pub bytes: Bytes,
    pub declared_mime: String,
    pub original_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// What happened to the stored file's resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Downscaled and rewritten in place.
    Resized { width: u32, height: u32 },
    /// Already within the width budget; stored bytes untouched.
    Skipped,
    /// Decode or re-encode failed; the original-resolution file stands.
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct Ingested {
    pub image_id: i64,
    pub resize: ResizeOutcome,
}

pub struct IngestService {
    images: Arc<dyn ImagesRepo>,
    storage: Arc<ContentStorage>,
    max_upload_bytes: u64,
    max_width: u32,
}

impl IngestService {
    pub fn new(
        images: Arc<dyn ImagesRepo>,
        storage: Arc<ContentStorage>,
        max_upload_bytes: u64,
        max_width: u32,
    ) -> Self {
        Self {
            images,
            storage,
            max_upload_bytes,
            max_width,
        }
    }

    /// Run the full pipeline: validate, store, resize in place, record.
    pub async fn ingest(&self, upload: NewUpload) -> Result<Ingested, IngestError> {
        let declared = upload.declared_mime.trim().to_ascii_lowercase();
        if StoredFormat::from_mime(&declared).is_none() {
            counter!("cornice_ingest_rejected_total").increment(1);
            return Err(IngestError::UnsupportedFormat { declared });
        }

        if upload.bytes.len() as u64 > self.max_upload_bytes {
            counter!("cornice_ingest_rejected_total").increment(1);
            return Err(IngestError::PayloadTooLarge {
                limit_bytes: self.max_upload_bytes,
            });
        }

        let stored = self
            .storage
            .store(&upload.original_name, &upload.bytes)
            .await
            .map_err(IngestError::Storage)?;

        // The declared type got the payload through the door; from here
        // on the stored bytes decide what it actually is.
        let probed = match imaging::probe(&upload.bytes) {
            Ok(probed) => probed,
            Err(err) => {
                counter!("cornice_ingest_rejected_total").increment(1);
                warn!(
                    target = SOURCE,
                    filename = %stored.filename,
                    error = %err,
                    "stored upload is not a decodable image; file left in place"
                );
                return Err(IngestError::CorruptImage(err.to_string()));
            }
        };

        let resize = self.resize_in_place(&stored, &upload.bytes, probed).await;

        let image_id = self
            .images
            .insert_image(NewImage {
                filename: stored.filename.clone(),
                filepath: stored.relative_path.clone(),
                title: upload.title,
                description: upload.description,
            })
            .await
            .map_err(IngestError::Persistence)?;

        counter!("cornice_ingest_accepted_total").increment(1);
        info!(
            target = SOURCE,
            image_id,
            filename = %stored.filename,
            resized = matches!(resize, ResizeOutcome::Resized { .. }),
            "image ingested"
        );

        Ok(Ingested { image_id, resize })
    }

    /// Best-effort downscale of the stored file. Never fails the
    /// ingestion: the worst case is keeping the original resolution.
    async fn resize_in_place(
        &self,
        stored: &StoredFile,
        bytes: &[u8],
        probed: ProbedImage,
    ) -> ResizeOutcome {
        if probed.width <= self.max_width {
            counter!("cornice_resize_skipped_total").increment(1);
            return ResizeOutcome::Skipped;
        }

        let reencoded = decode_resize_encode(bytes, probed, self.max_width);
        let (width, height, buffer) = match reencoded {
            Ok(Some(result)) => result,
            // Probe and pixel decode disagree on width; trust the pixels
            // and leave the stored file alone.
            Ok(None) => {
                counter!("cornice_resize_skipped_total").increment(1);
                return ResizeOutcome::Skipped;
            }
            Err(err) => {
                counter!("cornice_resize_failed_total").increment(1);
                warn!(
                    target = SOURCE,
                    filename = %stored.filename,
                    error = %err,
                    "resize failed; keeping the original resolution"
                );
                return ResizeOutcome::Failed;
            }
        };

        match self.storage.overwrite(&stored.filename, &buffer).await {
            Ok(()) => {
                counter!("cornice_resize_total").increment(1);
                ResizeOutcome::Resized { width, height }
            }
            Err(err) => {
                counter!("cornice_resize_failed_total").increment(1);
                warn!(
                    target = SOURCE,
                    filename = %stored.filename,
                    error = %err,
                    "failed to rewrite resized file; keeping the original resolution"
                );
                ResizeOutcome::Failed
            }
        }
    }
}

fn decode_resize_encode(
    bytes: &[u8],
    probed: ProbedImage,
    max_width: u32,
) -> Result<Option<(u32, u32, Vec<u8>)>, ImagingError> {
    let decoded = imaging::decode(bytes, probed.format)?;
    let Some(resized) = imaging::resize_to_width(&decoded, max_width) else {
        return Ok(None);
    };
    let buffer = imaging::encode(&resized, probed.format)?;
    Ok(Some((resized.width(), resized.height(), buffer)))
}
