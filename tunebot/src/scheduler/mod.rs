//! Single-worker background scheduler.
//!
//! Tasks are drained from a FIFO queue by one worker and run strictly one
//! after another, concurrently with the submitting thread. Periodic jobs are
//! driven by ticker tasks that feed the same queue, so they never overlap
//! with one-off tasks either.
//!
//! Shutdown cancels the worker immediately: queued tasks that have not
//! started are dropped, and a task that is already running is abandoned at
//! its next await point.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

type Task = BoxFuture<'static, ()>;

/// Background scheduler with exactly one worker.
pub struct BackgroundScheduler {
    name: &'static str,
    sender: mpsc::UnboundedSender<Task>,
    cancellation_token: CancellationToken,
    /// Tasks submitted but not yet started.
    queued: Arc<AtomicUsize>,
    submitted: AtomicU64,
}

impl BackgroundScheduler {
    /// Create the scheduler and spawn its worker on the current runtime.
    pub fn new(name: &'static str) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancellation_token = CancellationToken::new();
        let queued = Arc::new(AtomicUsize::new(0));

        tokio::spawn(Self::run_worker(
            name,
            receiver,
            cancellation_token.clone(),
            queued.clone(),
        ));

        debug!(scheduler = name, "Background scheduler started");

        Self {
            name,
            sender,
            cancellation_token,
            queued,
            submitted: AtomicU64::new(0),
        }
    }

    async fn run_worker(
        name: &'static str,
        mut receiver: mpsc::UnboundedReceiver<Task>,
        cancellation_token: CancellationToken,
        queued: Arc<AtomicUsize>,
    ) {
        loop {
            let task = tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                task = receiver.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };
            let _ = queued.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

            trace!(scheduler = name, "Running task");
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    debug!(scheduler = name, "Abandoning in-flight task");
                    break;
                }
                _ = task => {}
            }
        }

        debug!(scheduler = name, "Background scheduler worker stopped");
    }

    /// Queue a task. Returns `false` if the scheduler has been shut down.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancellation_token.is_cancelled() {
            debug!(scheduler = self.name, "Rejecting task after shutdown");
            return false;
        }

        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(task.boxed()).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Run `job` on the worker after `initial_delay`, then every `period`
    /// after the previous run was queued, until shutdown.
    pub fn schedule_with_fixed_delay<F, Fut>(
        self: &Arc<Self>,
        initial_delay: Duration,
        period: Duration,
        job: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = Arc::downgrade(self);
        let cancellation_token = self.cancellation_token.clone();
        let name = self.name;

        tokio::spawn(async move {
            let mut delay = initial_delay;
            loop {
                tokio::select! {
                    _ = cancellation_token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                let Some(scheduler) = scheduler.upgrade() else {
                    break;
                };
                if !scheduler.submit(job()) {
                    break;
                }
                delay = period;
            }

            debug!(scheduler = name, "Periodic job stopped");
        });
    }

    /// Stop the worker and every periodic job.
    ///
    /// Returns the number of queued tasks that will never run.
    pub fn shutdown_now(&self) -> usize {
        if self.cancellation_token.is_cancelled() {
            return 0;
        }
        self.cancellation_token.cancel();

        let abandoned = self.queued.swap(0, Ordering::SeqCst);
        info!(
            scheduler = self.name,
            abandoned, "Background scheduler shut down"
        );
        abandoned
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// Total number of tasks accepted since creation.
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Number of tasks waiting for the worker.
    pub fn queued_count(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

impl Drop for BackgroundScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
