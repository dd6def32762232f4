//! Concurrent invalidation.
//!
//! The traversal stays on the calling thread so every branch is walked in the
//! same order as the sequential path. Yielded tasks go through a bounded
//! channel to a small pool of scoped worker threads that run the
//! invalidation primitive.
//!
//! Each task id is dispatched at most once per run, so two workers never work
//! on the outputs of the same task at the same time. The first error stops
//! dispatching; tasks already queued are drained without being touched.
//!
//! Cancellation is cooperative: the token is checked before a task is
//! dispatched and before a worker starts on a task. A removal that already
//! started always runs to completion.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{bounded, Receiver};
use tokio_util::sync::CancellationToken;

use crate::core::task::TaskNode;
use crate::invalidation::invalidate::{InvalidationReport, Invalidator};
use crate::invalidation::request::InvalidationRequest;
use crate::{dklog_debug, Error, Result};

const DEFAULT_WORKERS: usize = 4;

/// Options for concurrent invalidation.
#[derive(Debug, Clone)]
pub struct ConcurrentOptions {
    /// Number of worker threads. `0` and `1` run sequentially.
    pub workers: usize,
    /// Capacity of the dispatch channel.
    pub queue_depth: usize,
    /// Stops the run between removals when cancelled.
    pub cancel: CancellationToken,
}

impl ConcurrentOptions {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue_depth: workers.max(1) * 2,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }
}

impl Default for ConcurrentOptions {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

/// State shared between the dispatcher and the workers.
struct Shared {
    report: Mutex<InvalidationReport>,
    error: Mutex<Option<Error>>,
    failed: AtomicBool,
    cancelled: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        Self {
            report: Mutex::new(InvalidationReport::new()),
            error: Mutex::new(None),
            failed: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Keep only the first error.
    fn fail(&self, err: Error) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
        self.failed.store(true, Ordering::SeqCst);
    }

    fn should_stop(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn finish(self) -> Result<InvalidationReport> {
        let error = self.error.into_inner().unwrap_or_else(PoisonError::into_inner);
        if let Some(err) = error {
            return Err(err);
        }
        let mut report = self
            .report
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        report.cancelled = self.cancelled.load(Ordering::SeqCst);
        Ok(report)
    }
}

impl Invalidator {
    /// Invalidate the request's downstream tasks on a worker pool.
    ///
    /// Returns the first error hit by the traversal or any worker. A
    /// cancelled run returns the partial report with `cancelled` set.
    pub fn invalidate_downstream_concurrent<T>(
        &self,
        request: &InvalidationRequest<T>,
        options: &ConcurrentOptions,
    ) -> Result<InvalidationReport>
    where
        T: TaskNode + Send,
    {
        if options.workers <= 1 {
            return self.invalidate_cancellable(request, &options.cancel);
        }

        dklog_debug!(
            "invalidate_downstream_concurrent: workers={} queue={}",
            options.workers,
            options.queue_depth
        );

        let shared = Shared::new();
        let (tx, rx) = bounded::<T>(options.queue_depth.max(1));

        std::thread::scope(|scope| {
            for _ in 0..options.workers {
                let rx = rx.clone();
                let shared = &shared;
                let cancel = &options.cancel;
                scope.spawn(move || self.work(rx, shared, cancel));
            }
            drop(rx);

            let mut dispatched = HashSet::new();
            for task in request.downstream() {
                if shared.should_stop() {
                    break;
                }
                if options.cancel.is_cancelled() {
                    shared.cancelled.store(true, Ordering::SeqCst);
                    break;
                }
                match task {
                    Ok(task) => {
                        if !dispatched.insert(task.id()) {
                            continue;
                        }
                        if tx.send(task).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        shared.fail(err);
                        break;
                    }
                }
            }
            // Closing the channel lets the workers finish their loops.
            drop(tx);
        });

        shared.finish()
    }

    fn work<T: TaskNode>(&self, rx: Receiver<T>, shared: &Shared, cancel: &CancellationToken) {
        for task in rx.iter() {
            if shared.should_stop() {
                continue;
            }
            if cancel.is_cancelled() {
                shared.cancelled.store(true, Ordering::SeqCst);
                continue;
            }
            match self.invalidate(&task) {
                Ok(report) => shared
                    .report
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .merge(report),
                Err(err) => shared.fail(err),
            }
        }
    }

    /// Sequential invalidation that stops between tasks once cancelled.
    pub fn invalidate_cancellable<T: TaskNode>(
        &self,
        request: &InvalidationRequest<T>,
        cancel: &CancellationToken,
    ) -> Result<InvalidationReport> {
        let mut report = InvalidationReport::new();
        for task in request.downstream() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.merge(self.invalidate(&task?)?);
        }
        Ok(report)
    }
}

/// Invalidate the request's downstream tasks on a worker pool with default
/// invalidation settings.
pub fn invalidate_downstream_concurrent<T>(
    request: &InvalidationRequest<T>,
    options: &ConcurrentOptions,
) -> Result<InvalidationReport>
where
    T: TaskNode + Send,
{
    Invalidator::new().invalidate_downstream_concurrent(request, options)
}
