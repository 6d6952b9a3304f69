//! Fixed-size worker pool that transcodes batches of work items.
//!
//! ## Queues
//!
//! ```text
//!            jobs (rendezvous)              results (rendezvous)
//! submit ──► [ ] ──► worker 0 ─┐
//!                ──► worker 1 ─┼──► [ ] ──► caller: Item, Item, ..., BatchDone
//!                ──► worker 2 ─┘
//! ```
//!
//! Both queues have zero capacity: `submit` returns once a worker has taken
//! every item, and a worker blocks until the caller reads its result. That is
//! the only backpressure in the pipeline, so the caller must drain results
//! while a submission is in flight. [`WorkerPool::submit_batch`] does this for
//! you by feeding the jobs queue from a separate thread.
//!
//! ## Batches
//!
//! Every submission gets a [`BatchId`] and an immutable settings snapshot
//! shared by all of its items. Each result is published exactly once per
//! item, in completion order. After the last result of a batch the worker
//! that published it emits [`PoolEvent::BatchDone`], so consumers can stop
//! reading without knowing the item count.
//!
//! ## Shutdown
//!
//! A zero-capacity shutdown channel that never carries a message is closed on
//! [`WorkerPool::shutdown`] (or drop). Workers check it at the top of every
//! iteration and race it against every blocking send and receive, so a worker
//! parked on either queue wakes up and exits.

use crate::config::PoolConfig;
use crate::imaging::{ImageBackend, RustBackend};
use crate::transcode::{TranscodeError, TranscodeSettings, transcode_with};
use crate::types::{BatchId, BatchSummary, ItemStatus, TranscodeResult, WorkItem};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded, select};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker pool has shut down")]
    ShutDown,
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// What comes out of the results queue.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// Outcome for one submitted item.
    Item(TranscodeResult),
    /// Every item of `batch` has been published.
    BatchDone { batch: BatchId, total: usize },
}

/// Runtime pool options, usually built from the `[pool]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub workers: usize,
    pub item_timeout: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: 3,
            item_timeout: None,
        }
    }
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            workers: config.workers,
            item_timeout: config.item_timeout(),
        }
    }
}

/// Shared flag that marks a batch as cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State shared by every job of one submission.
struct BatchState {
    id: BatchId,
    total: usize,
    settings: TranscodeSettings,
    remaining: AtomicUsize,
    cancel: CancellationToken,
}

struct Job {
    batch: Arc<BatchState>,
    item: WorkItem,
}

// ============================================================================
// Pool
// ============================================================================

/// A started pool of transcode workers sharing one backend.
pub struct WorkerPool<B: ImageBackend + 'static = RustBackend> {
    jobs: Option<Sender<Job>>,
    results: Receiver<PoolEvent>,
    shutdown: Option<Sender<()>>,
    shutdown_signal: Receiver<()>,
    workers: Vec<JoinHandle<()>>,
    backend: Arc<B>,
    next_batch: AtomicU64,
    options: PoolOptions,
}

impl<B: ImageBackend + 'static> WorkerPool<B> {
    /// Spawn `options.workers` worker threads (at least one).
    pub fn start(backend: B, options: PoolOptions) -> Result<Self, PoolError> {
        let options = PoolOptions {
            workers: options.workers.max(1),
            ..options
        };
        let backend = Arc::new(backend);
        let (job_tx, job_rx) = bounded::<Job>(0);
        let (result_tx, result_rx) = bounded::<PoolEvent>(0);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let mut pool = Self {
            jobs: Some(job_tx),
            results: result_rx,
            shutdown: Some(shutdown_tx),
            shutdown_signal: shutdown_rx.clone(),
            workers: Vec::with_capacity(options.workers),
            backend: Arc::clone(&backend),
            next_batch: AtomicU64::new(1),
            options,
        };

        for id in 0..options.workers {
            let worker = Worker {
                id,
                backend: Arc::clone(&backend),
                jobs: job_rx.clone(),
                results: result_tx.clone(),
                shutdown: shutdown_rx.clone(),
                item_timeout: options.item_timeout,
            };
            // On failure `pool` drops here, which stops the workers already spawned.
            let handle = thread::Builder::new()
                .name(format!("transcode-worker-{id}"))
                .spawn(move || worker.run())?;
            pool.workers.push(handle);
        }

        info!(workers = options.workers, timeout = ?options.item_timeout, "worker pool started");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.options.workers
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The shared results queue. Events from every batch arrive here.
    pub fn results(&self) -> &Receiver<PoolEvent> {
        &self.results
    }

    /// Queue `items` under one settings snapshot, blocking until a worker has
    /// taken each of them.
    ///
    /// Because the queues are unbuffered, something must be reading
    /// [`results`](Self::results) concurrently for a submission larger than
    /// the pool to complete. An empty submission produces no events.
    pub fn submit(
        &self,
        settings: TranscodeSettings,
        items: Vec<WorkItem>,
    ) -> Result<BatchId, PoolError> {
        let batch = self.new_batch(settings, items.len(), CancellationToken::new());
        let id = batch.id;
        let jobs = self.jobs.as_ref().ok_or(PoolError::ShutDown)?;
        enqueue(jobs, &self.shutdown_signal, batch, items)?;
        Ok(id)
    }

    /// Submit `items` from a feeder thread and return a handle that drains
    /// the batch's results.
    ///
    /// Holding the returned [`Batch`] borrows the pool mutably, so batches
    /// started this way never interleave.
    pub fn submit_batch(
        &mut self,
        settings: TranscodeSettings,
        items: Vec<WorkItem>,
    ) -> Result<Batch<'_>, PoolError> {
        let cancel = CancellationToken::new();
        let state = self.new_batch(settings, items.len(), cancel.clone());
        let id = state.id;
        let total = state.total;

        let feeder = if items.is_empty() {
            None
        } else {
            let jobs = self.jobs.clone().ok_or(PoolError::ShutDown)?;
            let shutdown = self.shutdown_signal.clone();
            let handle = thread::Builder::new()
                .name(format!("batch-feeder-{}", id.0))
                .spawn(move || enqueue(&jobs, &shutdown, state, items))?;
            Some(handle)
        };

        Ok(Batch {
            id,
            total,
            received: 0,
            done: total == 0,
            results: &self.results,
            cancel,
            feeder,
            summary: BatchSummary::default(),
        })
    }

    /// Stop every worker and wait for them to exit.
    ///
    /// Items already taken finish or are abandoned at their next blocking
    /// point; nothing more is published.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn new_batch(
        &self,
        settings: TranscodeSettings,
        total: usize,
        cancel: CancellationToken,
    ) -> Arc<BatchState> {
        let id = BatchId(self.next_batch.fetch_add(1, Ordering::Relaxed));
        info!(batch = %id, items = total, "batch submitted");
        Arc::new(BatchState {
            id,
            total,
            settings,
            remaining: AtomicUsize::new(total),
            cancel,
        })
    }

    fn stop(&mut self) {
        if self.shutdown.is_none() {
            return;
        }
        self.jobs.take();
        self.shutdown.take();
        for (id, handle) in self.workers.drain(..).enumerate() {
            if handle.join().is_err() {
                warn!(worker = id, "worker panicked");
            }
        }
        info!("worker pool stopped");
    }
}

impl<B: ImageBackend + 'static> Drop for WorkerPool<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Hand items to the jobs queue one at a time, in order.
fn enqueue(
    jobs: &Sender<Job>,
    shutdown: &Receiver<()>,
    batch: Arc<BatchState>,
    items: Vec<WorkItem>,
) -> Result<(), PoolError> {
    for item in items {
        let job = Job {
            batch: Arc::clone(&batch),
            item,
        };
        select! {
            send(jobs, job) -> res => res.map_err(|_| PoolError::ShutDown)?,
            recv(shutdown) -> _ => return Err(PoolError::ShutDown),
        }
    }
    Ok(())
}

// ============================================================================
// Worker
// ============================================================================

struct Worker<B> {
    id: usize,
    backend: Arc<B>,
    jobs: Receiver<Job>,
    results: Sender<PoolEvent>,
    shutdown: Receiver<()>,
    item_timeout: Option<Duration>,
}

impl<B: ImageBackend + 'static> Worker<B> {
    fn run(self) {
        debug!(worker = self.id, "worker started");
        loop {
            if matches!(self.shutdown.try_recv(), Err(TryRecvError::Disconnected)) {
                break;
            }

            let job = select! {
                recv(self.jobs) -> msg => match msg {
                    Ok(job) => job,
                    Err(_) => break,
                },
                recv(self.shutdown) -> _ => break,
            };

            let batch = Arc::clone(&job.batch);
            let result = self.process(job);
            if !self.publish(PoolEvent::Item(result)) {
                break;
            }

            if batch.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                debug!(worker = self.id, batch = %batch.id, "batch complete");
                let done = PoolEvent::BatchDone {
                    batch: batch.id,
                    total: batch.total,
                };
                if !self.publish(done) {
                    break;
                }
            }
        }
        debug!(worker = self.id, "worker exiting");
    }

    /// Send on the results queue unless the pool shuts down first.
    fn publish(&self, event: PoolEvent) -> bool {
        select! {
            send(self.results, event) -> res => res.is_ok(),
            recv(self.shutdown) -> _ => false,
        }
    }

    fn process(&self, job: Job) -> TranscodeResult {
        let Job { batch, mut item } = job;

        if batch.cancel.is_cancelled() {
            debug!(worker = self.id, batch = %batch.id, name = %item.name, "cancelled");
            item.status = ItemStatus::Cancelled;
            return TranscodeResult {
                batch: batch.id,
                item,
                output: None,
            };
        }

        debug!(worker = self.id, batch = %batch.id, name = %item.name, "transcoding");
        let outcome = match self.item_timeout {
            Some(timeout) => self.transcode_with_deadline(&batch, &item, timeout),
            None => Outcome::Finished(transcode_with(
                &*self.backend,
                &batch.settings,
                &item.path,
            )),
        };

        let (status, output) = match outcome {
            Outcome::Finished(Ok(path)) => match std::fs::metadata(&path) {
                Ok(meta) => (
                    ItemStatus::Done {
                        output_size: meta.len(),
                    },
                    Some(path),
                ),
                Err(e) => {
                    warn!(worker = self.id, output = %path.display(), error = %e, "output not readable after write");
                    (
                        ItemStatus::Unknown {
                            reason: e.to_string(),
                        },
                        Some(path),
                    )
                }
            },
            Outcome::Finished(Err(e)) => {
                warn!(worker = self.id, batch = %batch.id, name = %item.name, error = %e, "transcode failed");
                (
                    ItemStatus::Failed {
                        reason: e.to_string(),
                    },
                    None,
                )
            }
            Outcome::Spawn(e) => (
                ItemStatus::Failed {
                    reason: format!("failed to spawn transcode thread: {e}"),
                },
                None,
            ),
            Outcome::TimedOut => {
                warn!(worker = self.id, batch = %batch.id, name = %item.name, "transcode timed out");
                (ItemStatus::TimedOut, None)
            }
        };

        item.status = status;
        TranscodeResult {
            batch: batch.id,
            item,
            output,
        }
    }

    /// Run the transcode on a helper thread and wait at most `timeout`.
    ///
    /// A timed-out transcode keeps running in the background; its result is
    /// discarded.
    fn transcode_with_deadline(
        &self,
        batch: &Arc<BatchState>,
        item: &WorkItem,
        timeout: Duration,
    ) -> Outcome {
        let (tx, rx) = bounded(1);
        let backend = Arc::clone(&self.backend);
        let batch = Arc::clone(batch);
        let source = item.path.clone();
        let spawned = thread::Builder::new()
            .name(format!("transcode-{}", self.id))
            .spawn(move || {
                let _ = tx.send(transcode_with(&*backend, &batch.settings, &source));
            });
        if let Err(e) = spawned {
            return Outcome::Spawn(e);
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => Outcome::Finished(result),
            Err(RecvTimeoutError::Timeout) => Outcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Outcome::Finished(Err(TranscodeError::Io {
                path: item.path.clone(),
                source: std::io::Error::other("transcode thread panicked"),
            })),
        }
    }
}

enum Outcome {
    Finished(Result<PathBuf, TranscodeError>),
    Spawn(std::io::Error),
    TimedOut,
}

// ============================================================================
// Batch handle
// ============================================================================

/// Drains the results of one batch started with [`WorkerPool::submit_batch`].
///
/// Iterating yields each [`TranscodeResult`] in completion order and stops
/// after the batch's [`PoolEvent::BatchDone`]. Dropping an unfinished batch
/// cancels it and drains the rest.
pub struct Batch<'p> {
    id: BatchId,
    total: usize,
    received: usize,
    done: bool,
    results: &'p Receiver<PoolEvent>,
    cancel: CancellationToken,
    feeder: Option<JoinHandle<Result<(), PoolError>>>,
    summary: BatchSummary,
}

impl Batch<'_> {
    pub fn id(&self) -> BatchId {
        self.id
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Results received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Items not yet started will come back as [`ItemStatus::Cancelled`];
    /// in-flight items run to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Tally of the results received so far.
    pub fn summary(&self) -> &BatchSummary {
        &self.summary
    }

    /// Drain the remaining results and return the final tally.
    pub fn finish(mut self) -> Result<BatchSummary, PoolError> {
        for _ in self.by_ref() {}
        self.join_feeder()?;
        Ok(std::mem::take(&mut self.summary))
    }

    fn join_feeder(&mut self) -> Result<(), PoolError> {
        match self.feeder.take() {
            Some(handle) => handle.join().unwrap_or(Err(PoolError::ShutDown)),
            None => Ok(()),
        }
    }
}

impl Iterator for Batch<'_> {
    type Item = TranscodeResult;

    fn next(&mut self) -> Option<TranscodeResult> {
        while !self.done {
            match self.results.recv() {
                Ok(PoolEvent::Item(result)) if result.batch == self.id => {
                    self.received += 1;
                    self.summary.record(&result);
                    return Some(result);
                }
                Ok(PoolEvent::BatchDone { batch, .. }) if batch == self.id => {
                    self.done = true;
                }
                Ok(other) => {
                    debug!(batch = %self.id, event = ?other, "ignoring event from another batch");
                }
                Err(_) => {
                    warn!(batch = %self.id, received = self.received, "results queue closed");
                    self.done = true;
                }
            }
        }
        None
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.cancel.cancel();
            for _ in self.by_ref() {}
        }
        let _ = self.join_feeder();
    }
}
