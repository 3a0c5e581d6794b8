//! Content-directory storage for uploaded image files.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs;
use uuid::Uuid;

/// Directory prefix recorded in image filepaths.
pub const CONTENT_PREFIX: &str = "content";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid stored filename")]
    InvalidName,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The name and recorded path of a freshly stored upload.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub relative_path: String,
}

/// Filesystem-backed storage rooted at the configured content directory.
#[derive(Debug)]
pub struct ContentStorage {
    root: PathBuf,
}

impl ContentStorage {
    /// Root the storage at the provided directory, creating it if needed.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Persist an upload under a collision-resistant name derived from
    /// its original basename.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let filename = format!("{}_{}", unique_token(), sanitize_basename(original_name));
        let absolute = self.resolve(&filename)?;
        fs::write(&absolute, bytes).await?;

        Ok(StoredFile {
            relative_path: format!("{CONTENT_PREFIX}/{filename}"),
            filename,
        })
    }

    /// Replace a stored file's bytes; used by the in-place resize rewrite.
    pub async fn overwrite(&self, filename: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let absolute = self.resolve(filename)?;
        fs::write(&absolute, bytes).await?;
        Ok(())
    }

    /// Read a stored file into memory.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let absolute = self.resolve(filename)?;
        Ok(fs::read(absolute).await?)
    }

    /// Stored names are a single path component; anything else (absolute
    /// paths, `..`, separators) is rejected before touching the disk.
    fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(filename);
        let mut components = relative.components();
        let plain = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !plain {
            return Err(StorageError::InvalidName);
        }
        Ok(self.root.join(relative))
    }
}

/// Seconds-since-epoch in hex plus a UUID fragment: two concurrent
/// uploads sharing a basename still land on distinct names.
fn unique_token() -> String {
    let seconds = OffsetDateTime::now_utc().unix_timestamp();
    let entropy = Uuid::new_v4().simple().to_string();
    format!("{seconds:x}{}", &entropy[..8])
}

fn sanitize_basename(original: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("image");
    let mut base = slug::slugify(stem);
    if base.is_empty() {
        base = "image".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|value| !value.is_empty());

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}
