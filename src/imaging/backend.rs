//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from a backend: identify, read_exif, and render.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust with every
//! decoder statically linked into the binary.

use super::params::RenderParams;
use crate::metadata::ExifContainer;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unreadable EXIF: {0}")]
    Metadata(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` because the batch processor shares one backend across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode the image header and report its dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the embedded EXIF block. `Ok(None)` when the file has none.
    fn read_exif(&self, path: &Path) -> Result<Option<ExifContainer>, BackendError>;

    /// Decode `params.source` once and write every variant from that decode.
    ///
    /// Returns the output dimensions in the same order as `params.variants`.
    fn render(&self, params: &RenderParams) -> Result<Vec<Dimensions>, BackendError>;
}
