//! Transform Module
//!
//! Derived-artifact generation for blob-backed stores. The image store uses
//! [`ThumbnailTransform`] to produce thumbnails next to the original upload.

use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};
use thiserror::Error;

// == Transform Error ==
/// Failure while producing a derived artifact.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Input bytes could not be decoded
    #[error("cannot decode input: {0}")]
    Decode(String),

    /// Output could not be encoded
    #[error("cannot encode output: {0}")]
    Encode(String),

    /// The worker running the transform died
    #[error("transform aborted: {0}")]
    Aborted(String),
}

// == Transform Trait ==
/// Pure, synchronous bytes-to-bytes function.
pub trait Transform: Send + Sync {
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError>;
}

// == Thumbnail Transform ==
/// Resizes an image to fill `width` x `height`, cropping the overflow, and
/// re-encodes it in the input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailTransform {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailTransform {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ThumbnailTransform {
    fn default() -> Self {
        Self::new(200, 200)
    }
}

impl Transform for ThumbnailTransform {
    fn apply(&self, bytes: &[u8]) -> Result<Vec<u8>, TransformError> {
        let format =
            image::guess_format(bytes).map_err(|e| TransformError::Decode(e.to_string()))?;
        let source = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| TransformError::Decode(e.to_string()))?;

        let thumb = source.resize_to_fill(self.width, self.height, FilterType::Lanczos3);

        let mut out = Cursor::new(Vec::new());
        if format.writing_enabled() && thumb.write_to(&mut out, format).is_ok() {
            return Ok(out.into_inner());
        }

        // Formats we can read but not write (or color types the encoder
        // refuses) fall back to PNG.
        let mut out = Cursor::new(Vec::new());
        thumb
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| TransformError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }
}
