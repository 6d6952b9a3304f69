//! # batch-resize
//!
//! Resize, rotate and re-encode a folder of images to JPEG with a small pool
//! of worker threads.
//!
//! # Architecture: Scan, Submit, Drain
//!
//! ```text
//! 1. Scan      photos/          →  Vec<WorkItem>           (pending, largest first)
//! 2. Submit    Vec<WorkItem>    →  WorkerPool jobs queue   (one settings snapshot per batch)
//! 3. Drain     results queue    →  TranscodeResult ... BatchDone
//! ```
//!
//! Each worker runs the same per-file pipeline:
//!
//! ```text
//! decode (png | jpeg | gif) → resize (Lanczos3) → rotate (quarter turns) → JPEG at quality Q
//! ```
//!
//! Results come back in completion order, one per submitted item, and are
//! correlated by file name. A failing image never aborts the batch; it shows
//! up as a failed result.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists candidate images in one folder as pending work items |
//! | [`transcode`] | Output naming, directory creation and the single-file [`transcode::Transcoder`] |
//! | [`pool`] | Fixed-size worker pool over rendezvous queues, with batches, cancellation and shutdown |
//! | [`imaging`] | Pixel work behind the [`imaging::ImageBackend`] trait: decode, resize, rotate, encode |
//! | [`config`] | `batch-resize.toml` loading, merging and validation |
//! | [`types`] | Work items, statuses, results and batch summaries shared across modules |
//! | [`output`] | CLI formatting of scan listings, results, summaries and the JSON report |
//!
//! # Design Decisions
//!
//! ## Resize Then Rotate
//!
//! Target width and height always refer to the image as stored, before any
//! rotation. A 200x100 source with `width = 100` and `rotate = 90` is
//! resized to 100x50 and written as 50x100.
//!
//! ## Settings Snapshots
//!
//! A batch captures its [`transcode::TranscodeSettings`] by value when it is
//! submitted. Reconfiguring a [`transcode::Transcoder`] afterwards only
//! affects the next batch.
//!
//! ## Unbuffered Queues
//!
//! The jobs and results queues are rendezvous channels. Nothing piles up in
//! memory: at most one decoded image per worker exists at a time, and a slow
//! consumer slows the workers down instead of growing a buffer.

pub mod config;
pub mod imaging;
pub mod output;
pub mod pool;
pub mod scan;
pub mod transcode;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
