//! Shared test utilities for the batch-resize test suite.
//!
//! Provides synthetic fixture writers (no binary fixtures are checked in) and
//! small lookup helpers for batch results.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("a.jpg"), 200, 100);
//! write_corrupt_jpeg(&tmp.path().join("broken.jpg"));
//!
//! let result = find_result(&results, "a.jpg");
//! assert!(result.item.status.is_success());
//! ```

use crate::types::{TranscodeResult, WorkItem};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Fixture writers
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]))
}

/// Write a small valid JPEG with a gradient.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a small valid PNG with a gradient.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a small valid GIF with a transparent border.
pub fn create_test_gif(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([200, (x % 256) as u8, (y % 256) as u8, 255])
        }
    });
    DynamicImage::ImageRgba8(img)
        .save_with_format(path, ImageFormat::Gif)
        .unwrap();
}

fn noise(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let h = (x.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)).rotate_left(7);
        Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
    })
}

/// Write a PNG full of high-frequency detail, so JPEG quality visibly matters.
pub fn create_noisy_png(path: &Path, width: u32, height: u32) {
    noise(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write the first few bytes of a real JPEG, truncated mid-header.
pub fn write_corrupt_jpeg(path: &Path) {
    let img = gradient(64, 64);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), 64, 64, ExtendedColorType::Rgb8)
        .unwrap();
    std::fs::write(path, &bytes[..40]).unwrap();
}

/// Encode a noisy image as JPEG in memory.
///
/// Noise keeps the entropy-coded scan large, so truncating the result by a
/// fraction cuts into pixel data rather than the header.
pub fn noisy_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = noise(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 90)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Write the first `percent`% of a 256x256 noisy JPEG, cut inside its scan data.
pub fn write_truncated_jpeg(path: &Path, percent: usize) {
    let bytes = noisy_jpeg_bytes(256, 256);
    std::fs::write(path, &bytes[..bytes.len() * percent / 100]).unwrap();
}

/// Build a pending work item for an existing file.
pub fn work_item(path: &Path) -> WorkItem {
    WorkItem::from_path(path).unwrap()
}

// =========================================================================
// Result lookups: panic with the missing name
// =========================================================================

/// Find a result by item name. Panics if not found.
pub fn find_result<'a>(results: &'a [TranscodeResult], name: &str) -> &'a TranscodeResult {
    results
        .iter()
        .find(|r| r.item.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = results.iter().map(|r| r.item.name.as_str()).collect();
            panic!("result '{name}' not found. Available: {names:?}")
        })
}

/// All result names, sorted, for order-independent comparisons.
pub fn sorted_names(results: &[TranscodeResult]) -> Vec<String> {
    let mut names: Vec<String> = results.iter().map(|r| r.item.name.clone()).collect();
    names.sort();
    names
}
