use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::store::CommentStore;

/// Configuration for the comment flusher.
#[derive(Clone, Debug)]
pub struct FlusherConfig {
    pub flush_interval: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
        }
    }
}

/// Summary of one flush cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub posts_written: usize,
    pub comments_written: usize,
    pub posts_failed: usize,
}

/// Background task that periodically persists buffered comments.
pub struct CommentFlusher {
    store: CommentStore,
    flush_interval: Duration,
}

impl CommentFlusher {
    pub(crate) fn new(store: CommentStore, flush_interval: Duration) -> Self {
        Self {
            store,
            flush_interval,
        }
    }

    /// Run one flush on the blocking pool.
    pub async fn flush(&self) -> FlushReport {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.flush_now()).await {
            Ok(report) => {
                if report != FlushReport::default() {
                    debug!(
                        posts = report.posts_written,
                        comments = report.comments_written,
                        failed = report.posts_failed,
                        "comment flush"
                    );
                }
                report
            }
            Err(e) => {
                error!(error = %e, "comment flush task failed");
                FlushReport::default()
            }
        }
    }

    /// Flush on every tick until shutdown is requested, then flush once more.
    pub async fn run(self, stop: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip the first immediate tick

        info!(interval_ms = self.flush_interval.as_millis() as u64, "comment flusher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = stop.notified() => break,
            }
        }

        let report = self.flush().await;
        info!(posts = report.posts_written, failed = report.posts_failed, "comment flusher stopped");
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self) -> FlusherHandle {
        let stop = Arc::new(Notify::new());
        let task = tokio::spawn(self.run(Arc::clone(&stop)));
        FlusherHandle { stop, task }
    }
}

/// Handle to a spawned [`CommentFlusher`].
#[derive(Debug)]
pub struct FlusherHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl FlusherHandle {
    /// Ask the flusher to persist what is buffered and exit, and wait for it.
    pub async fn shutdown(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            error!(error = %e, "comment flusher terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
