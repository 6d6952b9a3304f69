//! CLI output formatting for scan listings and batch results.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Images (3)
//! 001 harbour.png   2.4 MB  2024-05-01 09:12:44
//! 002 dawn.jpg      1.1 MB  2024-04-28 18:03:10
//! 003 logo.gif      8.2 kB  2023-11-02 07:55:01
//! ```
//!
//! ## Run
//!
//! One entry per result, in completion order, then a summary:
//!
//! ```text
//! dawn.jpg: done [312.0 kB]
//!     Output: /home/me/photos/out/dawn_resized.jpg
//! logo.jpg: failed: Cannot decode /home/me/photos/logo.jpg: unexpected end of file (no JPEG end-of-image marker)
//! harbour.png: done [590.4 kB]
//!     Output: /home/me/photos/out/harbour_resized.jpg
//!
//! Processed 3 images: 2 done, 1 failed
//! Input 3.5 MB → output 902.4 kB
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::types::{BatchId, BatchSummary, ItemStatus, TranscodeResult, WorkItem};
use serde::Serialize;

const SI_UNITS: [&str; 6] = ["B", "kB", "MB", "GB", "TB", "PB"];

/// Render a byte count with decimal (SI) units and one decimal place.
///
/// Values under 1000 are shown as whole bytes.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < SI_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    // 999_950 rounds to "1000.0 kB" at one decimal; promote it.
    if format!("{:.1}", value) == "1000.0" && unit < SI_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SI_UNITS[unit])
}

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

// ============================================================================
// Scan output
// ============================================================================

/// Format the candidate list produced by [`scan`](crate::scan::scan).
pub fn format_scan_output(items: &[WorkItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["No images found".to_string()];
    }

    let name_width = items.iter().map(|i| i.name.chars().count()).max().unwrap_or(0);
    let mut lines = vec![format!("Images ({})", items.len())];
    for (i, item) in items.iter().enumerate() {
        lines.push(format!(
            "{} {:<name_width$}  {:>8}  {}",
            format_index(i + 1),
            item.name,
            format_bytes(item.size),
            item.modified_display(),
        ));
    }
    lines
}

pub fn print_scan_output(items: &[WorkItem]) {
    for line in format_scan_output(items) {
        println!("{}", line);
    }
}

// ============================================================================
// Run output
// ============================================================================

/// Format one pool result: the status line, plus the output path on success.
pub fn format_result(result: &TranscodeResult) -> Vec<String> {
    let mut lines = vec![format!("{}: {}", result.item.name, result.item.status)];
    if let (ItemStatus::Done { .. }, Some(output)) = (&result.item.status, &result.output) {
        lines.push(format!("    Output: {}", output.display()));
    }
    lines
}

pub fn print_result(result: &TranscodeResult) {
    for line in format_result(result) {
        println!("{}", line);
    }
}

/// Format the end-of-batch tally. Zero counts other than `done` are omitted.
pub fn format_summary(summary: &BatchSummary) -> Vec<String> {
    let noun = if summary.total == 1 { "image" } else { "images" };
    let mut parts = vec![format!("{} done", summary.succeeded)];
    for (count, label) in [
        (summary.failed, "failed"),
        (summary.unknown, "unknown"),
        (summary.cancelled, "cancelled"),
        (summary.timed_out, "timed out"),
    ] {
        if count > 0 {
            parts.push(format!("{} {}", count, label));
        }
    }

    let mut lines = vec![format!(
        "Processed {} {}: {}",
        summary.total,
        noun,
        parts.join(", ")
    )];
    if summary.succeeded > 0 {
        lines.push(format!(
            "Input {} → output {}",
            format_bytes(summary.input_bytes),
            format_bytes(summary.output_bytes)
        ));
    }
    lines
}

pub fn print_summary(summary: &BatchSummary) {
    println!();
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// JSON report
// ============================================================================

/// Machine-readable record of one batch, written by `run --json`.
#[derive(Debug, Serialize)]
pub struct BatchReport<'a> {
    pub batch: BatchId,
    pub summary: &'a BatchSummary,
    pub results: &'a [TranscodeResult],
}

pub fn format_json_report(
    batch: BatchId,
    summary: &BatchSummary,
    results: &[TranscodeResult],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&BatchReport {
        batch,
        summary,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn item(name: &str, size: u64, status: ItemStatus) -> WorkItem {
        WorkItem {
            name: name.to_string(),
            path: PathBuf::from("/in").join(name),
            size,
            modified: None,
            status,
        }
    }

    fn result(name: &str, status: ItemStatus, output: Option<&str>) -> TranscodeResult {
        TranscodeResult {
            batch: BatchId(7),
            item: item(name, 2_000, status),
            output: output.map(PathBuf::from),
        }
    }

    // =========================================================================
    // format_bytes
    // =========================================================================

    #[test]
    fn format_bytes_small_values_are_whole_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(999), "999 B");
    }

    #[test]
    fn format_bytes_uses_decimal_units() {
        assert_eq!(format_bytes(1000), "1.0 kB");
        assert_eq!(format_bytes(1024), "1.0 kB");
        assert_eq!(format_bytes(1_200_000), "1.2 MB");
        assert_eq!(format_bytes(3_500_000_000), "3.5 GB");
    }

    #[test]
    fn format_bytes_promotes_at_unit_boundary() {
        assert_eq!(format_bytes(999_999), "1.0 MB");
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(1000), "1000");
    }

    // =========================================================================
    // Scan listing
    // =========================================================================

    #[test]
    fn scan_output_empty() {
        assert_eq!(format_scan_output(&[]), vec!["No images found"]);
    }

    #[test]
    fn scan_output_aligns_names() {
        let items = vec![
            item("harbour.png", 2_400_000, ItemStatus::Pending),
            item("a.gif", 8_200, ItemStatus::Pending),
        ];
        let lines = format_scan_output(&items);
        assert_eq!(lines[0], "Images (2)");
        assert_eq!(lines[1], "001 harbour.png    2.4 MB  -");
        assert_eq!(lines[2], "002 a.gif          8.2 kB  -");
    }

    // =========================================================================
    // Results and summary
    // =========================================================================

    #[test]
    fn result_done_shows_output_path() {
        let lines = format_result(&result(
            "dawn.jpg",
            ItemStatus::Done { output_size: 312_000 },
            Some("out/dawn_resized.jpg"),
        ));
        assert_eq!(
            lines,
            vec!["dawn.jpg: done [312.0 kB]", "    Output: out/dawn_resized.jpg"]
        );
    }

    #[test]
    fn result_failed_is_one_line() {
        let lines = format_result(&result(
            "logo.gif",
            ItemStatus::Failed {
                reason: "bad header".into(),
            },
            None,
        ));
        assert_eq!(lines, vec!["logo.gif: failed: bad header"]);
    }

    #[test]
    fn result_failed_shows_transcode_error_text() {
        let error = crate::transcode::TranscodeError::Decode {
            path: PathBuf::from("/home/me/photos/logo.jpg"),
            reason: "unexpected end of file (no JPEG end-of-image marker)".into(),
        };
        let lines = format_result(&result(
            "logo.jpg",
            ItemStatus::Failed {
                reason: error.to_string(),
            },
            None,
        ));
        assert_eq!(
            lines,
            vec![
                "logo.jpg: failed: Cannot decode /home/me/photos/logo.jpg: \
                 unexpected end of file (no JPEG end-of-image marker)"
            ]
        );
    }

    #[test]
    fn result_unknown_hides_output_path() {
        let lines = format_result(&result(
            "x.png",
            ItemStatus::Unknown {
                reason: "gone".into(),
            },
            Some("out/x_resized.jpg"),
        ));
        assert_eq!(lines, vec!["x.png: unknown error: gone"]);
    }

    #[test]
    fn summary_lists_nonzero_counts() {
        let summary = BatchSummary {
            total: 4,
            succeeded: 3,
            failed: 1,
            input_bytes: 3_500_000,
            output_bytes: 902_400,
            ..Default::default()
        };
        assert_eq!(
            format_summary(&summary),
            vec![
                "Processed 4 images: 3 done, 1 failed",
                "Input 3.5 MB → output 902.4 kB",
            ]
        );
    }

    #[test]
    fn summary_without_successes_has_no_size_line() {
        let summary = BatchSummary {
            total: 1,
            cancelled: 1,
            ..Default::default()
        };
        assert_eq!(
            format_summary(&summary),
            vec!["Processed 1 image: 0 done, 1 cancelled"]
        );
    }

    #[test]
    fn json_report_contains_results() {
        let results = vec![result(
            "dawn.jpg",
            ItemStatus::Done { output_size: 10 },
            Some("out/dawn_resized.jpg"),
        )];
        let mut summary = BatchSummary::default();
        summary.record(&results[0]);

        let json = format_json_report(BatchId(7), &summary, &results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["batch"], 7);
        assert_eq!(value["summary"]["succeeded"], 1);
        assert_eq!(value["results"][0]["item"]["name"], "dawn.jpg");
        assert_eq!(value["results"][0]["item"]["status"]["state"], "done");
        assert_eq!(value["results"][0]["output"], "out/dawn_resized.jpg");
    }
}
