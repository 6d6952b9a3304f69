//! Pure Rust image processing backend built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, GIF) | `image::ImageReader` with content sniffing |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Rotate | [`rotate`](super::rotate::rotate) (pure buffer mapping) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_resize_dimensions;
use super::params::{Quality, TranscodeParams};
use super::rotate::rotate;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Input extensions and the decoder each one maps to.
///
/// Matching is exact and lowercase: `photo.JPG` is not a candidate.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its bytes.
///
/// The JPEG decoder fills missing scan data with grey instead of failing, so
/// a JPEG whose last scan has no end-of-image marker is rejected up front.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let bytes = std::fs::read(path)?;
    let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(BackendError::Io)?;

    if reader.format() == Some(ImageFormat::Jpeg) && !jpeg_is_complete(&bytes) {
        return Err(BackendError::Decode(
            "unexpected end of file (no JPEG end-of-image marker)".to_string(),
        ));
    }

    reader.decode().map_err(|e| BackendError::Decode(e.to_string()))
}

const JPEG_SOS: [u8; 2] = [0xFF, 0xDA];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Whether an end-of-image marker follows the last start-of-scan marker.
///
/// Entropy-coded data stuffs every `0xFF` as `FF 00`, so both markers can
/// only appear as real markers. An embedded EXIF thumbnail ends before the
/// main image's scan, so its EOI does not count.
fn jpeg_is_complete(bytes: &[u8]) -> bool {
    let last_scan = bytes.windows(2).rposition(|w| w == JPEG_SOS);
    let last_eoi = bytes.windows(2).rposition(|w| w == JPEG_EOI);
    matches!((last_scan, last_eoi), (Some(scan), Some(eoi)) if eoi > scan)
}

/// Resize per the target-size policy, then flatten to 8-bit RGB for JPEG.
fn resize_to_rgb(img: DynamicImage, params: &TranscodeParams) -> RgbImage {
    if params.size.is_unchanged() {
        return img.into_rgb8();
    }
    let resized = match calculate_resize_dimensions((img.width(), img.height()), params.size) {
        Some((width, height)) => img.resize_exact(width, height, FilterType::Lanczos3),
        None => img,
    };
    resized.into_rgb8()
}

/// Encode and save as baseline JPEG.
fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)
        .map_err(|e| BackendError::Encode(format!("{}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality.value())
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::Encode(format!("{}: {}", path.display(), e)))?;
    writer
        .flush()
        .map_err(|e| BackendError::Encode(format!("{}: {}", path.display(), e)))
}

impl ImageBackend for RustBackend {
    fn transcode(&self, params: &TranscodeParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let rgb = resize_to_rgb(img, params);
        let rotated = rotate(&rgb, params.rotation);
        save_jpeg(&rotated, &params.output, params.quality)?;
        Ok(Dimensions {
            width: rotated.width(),
            height: rotated.height(),
        })
    }
}
