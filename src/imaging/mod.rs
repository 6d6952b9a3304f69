//! Image processing: decode, resize, rotate and JPEG encode in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG, GIF, sniffed from content) |
//! | **Resize** | Lanczos3, proportional or forced |
//! | **Rotate** | quarter turns via [`rotate()`] |
//! | **Encode** | `JpegEncoder` at quality 1–100 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math and output names (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Rotate**: Pure quarter-turn buffer transforms
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rotate;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{base_name, calculate_resize_dimensions, output_file_name};
pub use params::{Quality, TargetSize, TranscodeParams};
pub use rotate::{InvalidRotation, Rotation, rotate};
pub use rust_backend::{RustBackend, supported_input_extensions};
