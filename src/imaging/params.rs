//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`transcode`](crate::transcode) module (which decides
//! output paths and target sizes) and the [`backend`](super::backend) (which
//! does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1-100, default 85). Clamped on construction.
//! - [`TargetSize`]: requested width/height with the zero-means-free policy.
//! - [`TranscodeParams`]: everything one transcode needs: source, output, size, rotation, quality.

use super::rotate::Rotation;
use std::path::PathBuf;

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Requested output size.
///
/// - both zero: keep the source dimensions
/// - one zero: scale proportionally from the non-zero edge
/// - both non-zero: force exactly that size (may distort)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_unchanged(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Parameters for a single decode → resize → rotate → JPEG encode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub size: TargetSize,
    pub rotation: Rotation,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_85() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn target_size_zero_means_unchanged() {
        assert!(TargetSize::default().is_unchanged());
        assert!(!TargetSize::new(100, 0).is_unchanged());
        assert!(!TargetSize::new(0, 100).is_unchanged());
    }
}
