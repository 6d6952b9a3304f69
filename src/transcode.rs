//! Single-file transcoding: decode → resize → rotate → JPEG.
//!
//! The [`Transcoder`] owns the output configuration and exposes independent
//! setters; each one takes effect on the next [`Transcoder::transcode`] call.
//! The configuration itself is a plain value, [`TranscodeSettings`], so the
//! worker pool can capture an immutable snapshot per batch and share it across
//! workers behind an `Arc`.
//!
//! ## Steps
//!
//! ```text
//! 1. stat source              → SourceNotFound
//! 2. base name (strip .ext)
//! 3. create output dir        → CreateDir
//! 4. <dir>/<base>_resized.jpg   (or <dir>/<base>.jpg when overwriting)
//! 5. decode                   → Decode
//! 6. resize (Lanczos3)
//! 7. rotate the resized buffer
//! 8. encode JPEG              → Encode
//! ```
//!
//! Steps 5–8 run inside the [`ImageBackend`]; path planning and directory
//! handling stay here so they can be tested against a mock backend.
//!
//! There are no retries: one attempt per call, a failure is final for that item.

use crate::config::TransformConfig;
use crate::imaging::{
    BackendError, ImageBackend, InvalidRotation, Quality, Rotation, RustBackend, TargetSize,
    TranscodeParams, base_name, output_file_name,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("Source image not found: {path}")]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Cannot encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that shapes one transcode, captured as a value.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeSettings {
    pub output_dir: PathBuf,
    pub size: TargetSize,
    pub quality: Quality,
    pub rotation: Rotation,
    pub overwrite: bool,
}

impl Default for TranscodeSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            size: TargetSize::default(),
            quality: Quality::default(),
            rotation: Rotation::None,
            overwrite: false,
        }
    }
}

impl TranscodeSettings {
    /// Build settings from the `[transform]` config section.
    ///
    /// `default_output_dir` is used when the config names no output directory.
    pub fn from_config(
        config: &TransformConfig,
        default_output_dir: &Path,
    ) -> Result<Self, InvalidRotation> {
        Ok(Self {
            output_dir: config
                .output_dir
                .clone()
                .unwrap_or_else(|| default_output_dir.to_path_buf()),
            size: TargetSize::new(config.width, config.height),
            quality: Quality::new(config.quality),
            rotation: config.rotation()?,
            overwrite: config.overwrite,
        })
    }
}

/// Compute where the JPEG for `source` goes.
///
/// ```
/// # use batch_resize::transcode::plan_output_path;
/// # use std::path::{Path, PathBuf};
/// let out = Path::new("/tmp/out");
/// assert_eq!(plan_output_path(Path::new("/in/photo.png"), out, false), PathBuf::from("/tmp/out/photo_resized.jpg"));
/// assert_eq!(plan_output_path(Path::new("/in/photo.png"), out, true), PathBuf::from("/tmp/out/photo.jpg"));
/// ```
pub fn plan_output_path(source: &Path, output_dir: &Path, overwrite: bool) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    output_dir.join(output_file_name(base_name(&file_name), overwrite))
}

/// Transcode one file with explicit settings and backend.
///
/// This is the function workers call: it borrows everything and keeps no state.
pub fn transcode_with(
    backend: &impl ImageBackend,
    settings: &TranscodeSettings,
    source: &Path,
) -> Result<PathBuf, TranscodeError> {
    std::fs::metadata(source).map_err(|e| TranscodeError::SourceNotFound {
        path: source.to_path_buf(),
        source: e,
    })?;

    std::fs::create_dir_all(&settings.output_dir).map_err(|e| TranscodeError::CreateDir {
        path: settings.output_dir.clone(),
        source: e,
    })?;

    let output = plan_output_path(source, &settings.output_dir, settings.overwrite);
    let params = TranscodeParams {
        source: source.to_path_buf(),
        output: output.clone(),
        size: settings.size,
        rotation: settings.rotation,
        quality: settings.quality,
    };

    let dims = backend.transcode(&params).map_err(|e| match e {
        BackendError::Decode(reason) => TranscodeError::Decode {
            path: source.to_path_buf(),
            reason,
        },
        BackendError::Encode(reason) => TranscodeError::Encode {
            path: output.clone(),
            reason,
        },
        BackendError::Io(e) => TranscodeError::Io {
            path: source.to_path_buf(),
            source: e,
        },
    })?;

    debug!(
        source = %source.display(),
        output = %output.display(),
        width = dims.width,
        height = dims.height,
        "transcoded"
    );
    Ok(output)
}

/// Configurable single-file transcoder.
///
/// Generic over the backend so tests can substitute a mock; production code
/// uses the default [`RustBackend`].
pub struct Transcoder<B: ImageBackend = RustBackend> {
    backend: B,
    settings: TranscodeSettings,
}

impl Transcoder<RustBackend> {
    pub fn new() -> Self {
        Self::with_backend(RustBackend::new())
    }
}

impl Default for Transcoder<RustBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ImageBackend> Transcoder<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            settings: TranscodeSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: TranscodeSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) {
        self.settings.output_dir = dir.into();
    }

    pub fn set_width(&mut self, width: u32) {
        self.settings.size.width = width;
    }

    pub fn set_height(&mut self, height: u32) {
        self.settings.size.height = height;
    }

    /// Set JPEG quality; values outside 1–100 are clamped.
    pub fn set_quality(&mut self, quality: u32) {
        self.settings.quality = Quality::new(quality);
    }

    pub fn set_overwrite(&mut self, overwrite: bool) {
        self.settings.overwrite = overwrite;
    }

    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.settings.rotation = rotation;
    }

    /// Current settings. Clone this to hand a snapshot to a batch.
    pub fn settings(&self) -> &TranscodeSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Transcode one source file with the current settings.
    pub fn transcode(&self, source: &Path) -> Result<PathBuf, TranscodeError> {
        transcode_with(&self.backend, &self.settings, source)
    }
}
