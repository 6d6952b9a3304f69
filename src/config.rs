//! Batch configuration module.
//!
//! Handles loading, validating, and merging `batch-resize.toml`. Stock
//! defaults are the base layer; a user config file overrides any subset of
//! keys, and command-line flags override both (applied in `main.rs`).
//!
//! ## Config File Location
//!
//! `batch-resize.toml` in the working directory is picked up automatically.
//! Pass `--config <FILE>` to read a different file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [transform]
//! width = 0                 # Target width  (0 = derive from height / keep)
//! height = 0                # Target height (0 = derive from width / keep)
//! quality = 85              # JPEG quality (1-100)
//! rotate = 0                # Clockwise rotation: 0, 90, 180 or 270
//! overwrite = false         # Write <name>.jpg instead of <name>_resized.jpg
//! # output_dir = "out"      # Omit to write next to the source images
//!
//! [pool]
//! workers = 3               # Concurrent transcode workers
//! # item_timeout_secs = 60  # Per-image deadline; omit for none
//!
//! [scan]
//! extensions = ["png", "jpg", "jpeg", "gif"]
//! min_size = 0              # Skip files smaller than this many bytes
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [transform]
//! width = 1600
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{InvalidRotation, Rotation, supported_input_extensions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "batch-resize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Batch configuration loaded from `batch-resize.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Resize, rotate and encode settings.
    pub transform: TransformConfig,
    /// Worker pool sizing and deadlines.
    pub pool: PoolConfig,
    /// Candidate file selection.
    pub scan: ScanConfig,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transform.quality == 0 || self.transform.quality > 100 {
            return Err(ConfigError::Validation(
                "transform.quality must be 1-100".into(),
            ));
        }
        self.transform
            .rotation()
            .map_err(|e| ConfigError::Validation(format!("transform.rotate: {e}")))?;
        if self.pool.workers == 0 {
            return Err(ConfigError::Validation(
                "pool.workers must be at least 1".into(),
            ));
        }
        if self.pool.item_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "pool.item_timeout_secs must be positive (omit it for no deadline)".into(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "scan.extensions must not be empty".into(),
            ));
        }
        let supported = supported_input_extensions();
        if let Some(ext) = self
            .scan
            .extensions
            .iter()
            .find(|ext| !supported.contains(&ext.as_str()))
        {
            return Err(ConfigError::Validation(format!(
                "scan.extensions: unsupported extension {ext:?} (supported: {})",
                supported.join(", ")
            )));
        }
        Ok(())
    }
}

/// Resize, rotate and encode settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Target width in pixels; 0 derives it from the height (or keeps it).
    pub width: u32,
    /// Target height in pixels; 0 derives it from the width (or keeps it).
    pub height: u32,
    /// JPEG quality (1 = smallest, 100 = best).
    pub quality: u32,
    /// Clockwise rotation in degrees: 0, 90, 180 or 270.
    pub rotate: u32,
    /// Write `<name>.jpg` instead of `<name>_resized.jpg`.
    pub overwrite: bool,
    /// Output directory. When absent, outputs go next to the sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            quality: 85,
            rotate: 0,
            overwrite: false,
            output_dir: None,
        }
    }
}

impl TransformConfig {
    /// The configured rotation, checked.
    pub fn rotation(&self) -> Result<Rotation, InvalidRotation> {
        Rotation::try_from(self.rotate)
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// Number of concurrent transcode workers.
    pub workers: usize,
    /// Per-image deadline in seconds. When absent, items may run indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_timeout_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            item_timeout_secs: None,
        }
    }
}

impl PoolConfig {
    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_secs.map(Duration::from_secs)
    }
}

/// Candidate file selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Lowercase extensions to pick up; matching is exact (`JPG` is skipped).
    pub extensions: Vec<String>,
    /// Skip files smaller than this many bytes.
    pub min_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: supported_input_extensions()
                .iter()
                .map(|e| e.to_string())
                .collect(),
            min_size: 0,
        }
    }
}

/// Parse a byte size such as `1048576`, `500KB`, `1MB` or `2.5 MB`.
///
/// Units are binary multiples (`1MB` = 1024 × 1024 bytes), case-insensitive.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => {
            return Err(ConfigError::Validation(format!(
                "unknown size unit {other:?} in {input:?}"
            )));
        }
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("invalid size {input:?}")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!("invalid size {input:?}")));
    }
    Ok((value * multiplier as f64).round() as u64)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(BatchConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BatchConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, or from `batch-resize.toml` in the
/// working directory when `path` is `None`.
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load_config(path: Option<&Path>) -> Result<BatchConfig, ConfigError> {
    let overlay = match path {
        Some(p) => {
            let value = load_raw_config(p)?;
            if value.is_none() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", p.display()),
                )));
            }
            value
        }
        None => load_raw_config(Path::new(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `batch-resize.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# batch-resize configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override values from this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Transform
# ---------------------------------------------------------------------------
[transform]
# Target size in pixels.
#   width = 0, height = 0   keep the original size
#   only one non-zero       scale proportionally
#   both non-zero           force that exact size (may distort)
width = 0
height = 0

# JPEG quality (1 = smallest file, 100 = best quality).
quality = 85

# Clockwise rotation applied after resizing: 0, 90, 180 or 270.
rotate = 0

# Write <name>.jpg instead of <name>_resized.jpg. Combined with an output
# directory equal to the source directory, this replaces matching JPEGs.
overwrite = false

# Output directory, created if missing. Omit to write next to the sources.
# output_dir = "resized"

# ---------------------------------------------------------------------------
# Worker pool
# ---------------------------------------------------------------------------
[pool]
# Number of images transcoded concurrently.
workers = 3

# Give up on a single image after this many seconds. Omit for no deadline.
# item_timeout_secs = 60

# ---------------------------------------------------------------------------
# Scan
# ---------------------------------------------------------------------------
[scan]
# File extensions to pick up (exact, lowercase match).
extensions = ["png", "jpg", "jpeg", "gif"]

# Skip files smaller than this many bytes.
min_size = 0
"##
}
