//! Pure calculation functions for image dimensions and output names.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::TargetSize;

/// Calculate the output dimensions for a resize request.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Requested size; zero on an edge means "derive it"
///
/// # Returns
/// * `None` when both target edges are zero (no resize)
/// * `Some((width, height))` otherwise
///
/// # Examples
/// ```
/// # use batch_resize::imaging::{TargetSize, calculate_resize_dimensions};
/// // Width only: height follows the source aspect ratio
/// assert_eq!(calculate_resize_dimensions((200, 100), TargetSize::new(100, 0)), Some((100, 50)));
///
/// // Both edges: forced, may distort
/// assert_eq!(calculate_resize_dimensions((200, 100), TargetSize::new(50, 50)), Some((50, 50)));
/// ```
pub fn calculate_resize_dimensions(source: (u32, u32), target: TargetSize) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;

    match (target.width, target.height) {
        (0, 0) => None,
        (w, 0) => {
            let h = scale_edge(src_h, w, src_w);
            Some((w, h))
        }
        (0, h) => {
            let w = scale_edge(src_w, h, src_h);
            Some((w, h))
        }
        (w, h) => Some((w, h)),
    }
}

/// Scale `edge` by `numerator / denominator`, never collapsing below one pixel.
fn scale_edge(edge: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return edge.max(1);
    }
    let scaled = (edge as f64 * numerator as f64 / denominator as f64).round() as u32;
    scaled.max(1)
}

/// Strip the last extension segment from a file name.
///
/// Only the final `.ext` is removed, so `archive.tar.gz` becomes `archive.tar`.
/// Names without a dot, and dot-files like `.hidden`, are returned unchanged.
pub fn base_name(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(i) => &file_name[..i],
    }
}

/// Output file name for a given base name.
///
/// Overwrite mode drops the `_resized` suffix so that writing into the source
/// directory replaces a matching `<base>.jpg`.
pub fn output_file_name(base: &str, overwrite: bool) -> String {
    if overwrite {
        format!("{base}.jpg")
    } else {
        format!("{base}_resized.jpg")
    }
}
