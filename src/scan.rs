//! Folder enumeration into work items.
//!
//! Lists the direct children of one directory (no recursion) and turns every
//! file with an accepted extension into a pending [`WorkItem`]:
//!
//! ```text
//! photos/
//! ├── harbour.png      → WorkItem (2.4 MB)
//! ├── dawn.jpg         → WorkItem (1.1 MB)
//! ├── DSC_0001.JPG     skipped: extension match is exact and lowercase
//! ├── notes.txt        skipped: not an image extension
//! ├── README           skipped: no extension
//! └── raw/             skipped: directories are not descended into
//! ```
//!
//! Items are ordered largest first so the slowest transcodes start early;
//! names break ties.

use crate::config::ScanConfig;
use crate::types::WorkItem;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Enumerate candidate images directly inside `dir`.
///
/// Item paths are absolute: `dir` is canonicalized before listing.
pub fn scan(dir: &Path, config: &ScanConfig) -> Result<Vec<WorkItem>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }
    let dir = dir.canonicalize()?;
    let dir = dir.as_path();

    let mut items = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(ScanError::Io(e.into())),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_accepted_extension(entry.path(), config) {
            continue;
        }

        let item = match WorkItem::from_path(entry.path()) {
            Ok(item) => item,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping unreadable file");
                continue;
            }
        };
        if item.size < config.min_size {
            debug!(name = %item.name, size = item.size, "below minimum size");
            continue;
        }
        items.push(item);
    }

    items.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    debug!(dir = %dir.display(), count = items.len(), "scanned");
    Ok(items)
}

fn has_accepted_extension(path: &Path, config: &ScanConfig) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| config.extensions.iter().any(|allowed| allowed == ext))
}
