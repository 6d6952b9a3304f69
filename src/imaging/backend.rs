//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the one operation every backend must
//! support: transcode a source file into a JPEG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the recording
//! `MockBackend` below.

use super::params::TranscodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Backends are shared by every worker in the pool, so they must be
/// `Send + Sync` and hold no per-call state.
pub trait ImageBackend: Send + Sync {
    /// Decode `params.source`, resize, rotate, and write a JPEG to `params.output`.
    ///
    /// Returns the dimensions of the written image.
    fn transcode(&self, params: &TranscodeParams) -> Result<Dimensions, BackendError>;
}
