//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the export layer
//! needs: identify, decode, resample, and encode. Filter kernels and codecs
//! live behind this seam; the rest of the crate only decides *which* filter,
//! *which* size and *which* format.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{EncodeParams, ResampleFilter};
use super::picture::Picture;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Resample failed: {0}")]
    Resample(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every operation reports failure through [`BackendError`] and never panics,
/// so a batch can record the failure and move on.
pub trait ImageBackend {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode every frame the file holds. An empty list is a valid result for
    /// sources with no extractable frame.
    fn decode(&self, path: &Path) -> Result<Vec<Picture>, BackendError>;

    /// Return a resampled copy of `picture`.
    fn resample(
        &self,
        picture: &Picture,
        target: Dimensions,
        filter: ResampleFilter,
    ) -> Result<Picture, BackendError>;

    /// Encode `picture` and write it to `output`.
    fn encode(
        &self,
        picture: &Picture,
        output: &Path,
        params: &EncodeParams,
    ) -> Result<(), BackendError>;
}
