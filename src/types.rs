//! Shared types passed between the scanner, the worker pool and the CLI.
//!
//! A [`WorkItem`] is created by [`scan`](crate::scan) with status
//! [`ItemStatus::Pending`], travels through the [`pool`](crate::pool) by value,
//! and comes back inside a [`TranscodeResult`] with a terminal status.

use crate::output::format_bytes;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Timestamp format used for modification times in listings and reports.
pub const MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One source image queued for transcoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    /// File name including extension; the key results are correlated by.
    pub name: String,
    /// Absolute (or caller-supplied) path to the source file.
    pub path: PathBuf,
    /// Source size in bytes.
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Local>>,
    pub status: ItemStatus,
}

impl WorkItem {
    /// Build a pending item from a file on disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            status: ItemStatus::Pending,
        })
    }

    /// Modification time as `YYYY-MM-DD HH:MM:SS`, or `-` when unknown.
    pub fn modified_display(&self) -> String {
        self.modified
            .map(|t| t.format(MODIFIED_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Lifecycle of a work item: `Pending` until a worker publishes a terminal state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    /// Written successfully; `output_size` is the size of the JPEG in bytes.
    Done { output_size: u64 },
    /// Source, directory, decode or encode failure.
    Failed { reason: String },
    /// The output was written but could not be stat'ed afterwards.
    Unknown { reason: String },
    /// The batch was cancelled before this item started.
    Cancelled,
    /// The per-item deadline elapsed before the transcode finished.
    TimedOut,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Done { .. })
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "pending"),
            ItemStatus::Done { output_size } => write!(f, "done [{}]", format_bytes(*output_size)),
            ItemStatus::Failed { reason } => write!(f, "failed: {reason}"),
            ItemStatus::Unknown { reason } => write!(f, "unknown error: {reason}"),
            ItemStatus::Cancelled => write!(f, "cancelled"),
            ItemStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Identifies one submission to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome for exactly one submitted [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscodeResult {
    pub batch: BatchId,
    /// The submitted item with its terminal status set.
    pub item: WorkItem,
    /// Where the JPEG was written, when the transcode got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Per-batch tally, built by folding results as they arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
    pub cancelled: usize,
    pub timed_out: usize,
    /// Sum of source sizes for succeeded items.
    pub input_bytes: u64,
    /// Sum of output sizes for succeeded items.
    pub output_bytes: u64,
}

impl BatchSummary {
    /// Fold one result into the tally. Results still `Pending` are ignored.
    pub fn record(&mut self, result: &TranscodeResult) {
        if !result.item.status.is_terminal() {
            return;
        }
        self.total += 1;
        match &result.item.status {
            ItemStatus::Done { output_size } => {
                self.succeeded += 1;
                self.input_bytes += result.item.size;
                self.output_bytes += output_size;
            }
            ItemStatus::Failed { .. } => self.failed += 1,
            ItemStatus::Unknown { .. } => self.unknown += 1,
            ItemStatus::Cancelled => self.cancelled += 1,
            ItemStatus::TimedOut => self.timed_out += 1,
            ItemStatus::Pending => {}
        }
    }

    /// Whether every item in the batch succeeded.
    pub fn is_clean(&self) -> bool {
        self.succeeded == self.total
    }
}
