//! The paginated, aggregated gallery listing.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::application::repos::{ImagesRepo, RepoError};
use crate::domain::entities::GalleryEntry;

/// One page of the listing plus the pagination envelope the API
/// returns alongside it. `total` counts every image, not just the page.
#[derive(Debug)]
pub struct GalleryPage {
    pub entries: Vec<GalleryEntry>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

pub struct GalleryService {
    images: Arc<dyn ImagesRepo>,
    per_page: NonZeroU32,
}

impl GalleryService {
    pub fn new(images: Arc<dyn ImagesRepo>, per_page: NonZeroU32) -> Self {
        Self { images, per_page }
    }

    /// List one page, newest first. Pages start at 1; a page past the
    /// end yields an empty list, not an error.
    pub async fn list(&self, page: u32) -> Result<GalleryPage, RepoError> {
        let page = page.max(1);
        let per_page = self.per_page.get();
        let offset = (page - 1).saturating_mul(per_page);

        let entries = self.images.list_gallery(per_page, offset).await?;
        let total = self.images.count_images().await?;

        Ok(GalleryPage {
            entries,
            total,
            page,
            per_page,
        })
    }
}
