//! Decode, resize, and re-encode stored gallery images.
//!
//! The stored byte stream is the source of truth for format and
//! dimensions; the MIME type a client declares only gates the upload at
//! the door. [`probe`] inspects headers without touching pixel data, so
//! the common case (an image already within the width budget) never
//! pays for a full decode.

use std::io::Cursor;

use image::{
    DynamicImage, ImageFormat,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
    },
    imageops::FilterType,
};
use thiserror::Error;

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("unreadable image header: {0}")]
    Probe(String),
    #[error("failed to decode image pixels: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode resized image: {0}")]
    Encode(image::ImageError),
}

/// The four formats the gallery stores, each bound to its codec
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl StoredFormat {
    /// Map a client-declared MIME type onto a supported format.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn from_detected(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Webp => ImageFormat::WebP,
        }
    }

}

/// Format and dimensions read from the image header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedImage {
    pub format: StoredFormat,
    pub width: u32,
    pub height: u32,
}

/// Header-only inspection of a stored byte stream.
///
/// Never decodes pixel data. Fails when the bytes do not start with a
/// supported image signature, whatever MIME type the upload declared.
pub fn probe(bytes: &[u8]) -> Result<ProbedImage, ImagingError> {
    let format = image::guess_format(bytes)
        .ok()
        .and_then(StoredFormat::from_detected)
        .ok_or_else(|| ImagingError::Probe("no supported image signature".to_string()))?;

    let size = imagesize::blob_size(bytes).map_err(|err| ImagingError::Probe(err.to_string()))?;
    let width = u32::try_from(size.width)
        .map_err(|_| ImagingError::Probe("width out of range".to_string()))?;
    let height = u32::try_from(size.height)
        .map_err(|_| ImagingError::Probe("height out of range".to_string()))?;

    Ok(ProbedImage {
        format,
        width,
        height,
    })
}

/// Height that keeps the aspect ratio when width is clamped to
/// `max_width`. Standard rounding, half away from zero.
pub fn target_height(width: u32, height: u32, max_width: u32) -> u32 {
    let exact = f64::from(max_width) * f64::from(height) / f64::from(width);
    (exact.round() as u32).max(1)
}

/// Downscale to `max_width`, or `None` when the image already fits.
///
/// Pure over the input image. Alpha channels are resampled per pixel,
/// never composited against a background color.
pub fn resize_to_width(image: &DynamicImage, max_width: u32) -> Option<DynamicImage> {
    let (width, height) = (image.width(), image.height());
    if width <= max_width {
        return None;
    }
    let new_height = target_height(width, height, max_width);
    Some(image.resize_exact(max_width, new_height, FilterType::Triangle))
}

/// Full pixel decode in the probed format.
pub fn decode(bytes: &[u8], format: StoredFormat) -> Result<DynamicImage, ImagingError> {
    image::load_from_memory_with_format(bytes, format.image_format()).map_err(ImagingError::Decode)
}

/// Re-encode in the original format: JPEG quality 85, PNG zlib-default
/// compression, GIF and WEBP with their default encoders.
pub fn encode(image: &DynamicImage, format: StoredFormat) -> Result<Vec<u8>, ImagingError> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        StoredFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            image
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(ImagingError::Encode)?;
        }
        StoredFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut buffer, CompressionType::Default, PngFilter::Adaptive);
            image
                .write_with_encoder(encoder)
                .map_err(ImagingError::Encode)?;
        }
        StoredFormat::Gif | StoredFormat::Webp => {
            image
                .write_to(&mut buffer, format.image_format())
                .map_err(ImagingError::Encode)?;
        }
    }
    Ok(buffer.into_inner())
}
