//! # Scheduler Module
//!
//! A small worker-thread shim between the synchronous pipeline and a
//! UI-capable caller. One worker thread owns the [`UsageMonitor`], which
//! guarantees no two compute calls ever run concurrently; the caller submits
//! work and receives snapshots over channels.
//!
//! Periodic refresh drops a tick whenever a previous computation is still
//! queued or in flight, so slow disks cannot pile up work.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::models::Metrics;
use crate::monitor::UsageMonitor;

/// Cooperative cancellation flag, checked by the loader between files and
/// between lines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

type Task = Box<dyn FnOnce(&mut UsageMonitor) + Send>;

/// Handle to the worker thread.
///
/// Dropping the scheduler stops the ticker and shuts the worker down after
/// it finishes the task it is on.
pub struct Scheduler {
    task_tx: Sender<Task>,
    pending: Arc<AtomicUsize>,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
    ticker_stop: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Move the monitor onto a fresh worker thread.
    pub fn spawn(mut monitor: UsageMonitor) -> Self {
        let (task_tx, task_rx) = mpsc::channel::<Task>();
        let pending = Arc::new(AtomicUsize::new(0));
        let cancel = monitor.cancel_token();

        let worker_pending = Arc::clone(&pending);
        let worker = thread::spawn(move || {
            while let Ok(task) = task_rx.recv() {
                task(&mut monitor);
                worker_pending.fetch_sub(1, Ordering::SeqCst);
            }
        });

        Scheduler {
            task_tx,
            pending,
            cancel,
            worker: Some(worker),
            ticker_stop: Arc::new(AtomicBool::new(false)),
            ticker: None,
        }
    }

    fn submit(&self, task: Task) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.task_tx.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Submit one computation; the receiver yields exactly one snapshot.
    pub fn run_once(&self) -> Receiver<Result<Metrics>> {
        let (tx, rx) = mpsc::channel();
        self.submit(Box::new(move |monitor| {
            let _ = tx.send(monitor.compute_current());
        }));
        rx
    }

    /// Start the periodic refresh ticker. Each interval a computation is
    /// enqueued unless one is already queued or running, in which case the
    /// tick is dropped.
    pub fn start_periodic<F>(&mut self, interval: Duration, on_snapshot: F)
    where
        F: Fn(Result<Metrics>) + Send + Sync + 'static,
    {
        let on_snapshot = Arc::new(on_snapshot);
        let stop = Arc::clone(&self.ticker_stop);
        let pending = Arc::clone(&self.pending);
        let task_tx = self.task_tx.clone();

        let handle = thread::spawn(move || 'ticker: loop {
            // Sleep in short slices so shutdown never waits a full interval.
            let mut slept = Duration::ZERO;
            while slept < interval {
                let slice = Duration::from_millis(100).min(interval - slept);
                thread::sleep(slice);
                slept += slice;
                if stop.load(Ordering::SeqCst) {
                    break 'ticker;
                }
            }
            if pending.load(Ordering::SeqCst) > 0 {
                debug!("refresh tick dropped, computation still in flight");
                continue;
            }
            let cb = Arc::clone(&on_snapshot);
            pending.fetch_add(1, Ordering::SeqCst);
            let sent = task_tx.send(Box::new(move |monitor: &mut UsageMonitor| {
                cb(monitor.compute_current());
            }));
            if sent.is_err() {
                pending.fetch_sub(1, Ordering::SeqCst);
                break;
            }
        });
        self.ticker = Some(handle);
    }

    /// Cancel the in-flight computation, if any. The worker stays usable;
    /// the next submission resets the token.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True while a computation is queued or running.
    pub fn busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.ticker_stop.store(true, Ordering::SeqCst);
        self.cancel.cancel();
        // Closing the channel ends the worker loop.
        let (dead_tx, _) = mpsc::channel();
        let _ = std::mem::replace(&mut self.task_tx, dead_tx);
        if let Some(t) = self.ticker.take() {
            let _ = t.join();
        }
        if let Some(w) = self.worker.take() {
            let _ = w.join();
        }
    }
}
