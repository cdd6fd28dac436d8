use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use flatblog_types::PostId;

use crate::files::StatsFiles;

/// Configuration for the view coalescer.
#[derive(Clone, Debug)]
pub struct CoalescerConfig {
    /// Capacity of the view event queue. Events beyond it are dropped.
    pub queue_capacity: usize,
    /// How often tallies are written to disk.
    pub flush_interval: Duration,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            flush_interval: Duration::from_secs(60),
        }
    }
}

/// Background collector that turns view events into batched counter writes.
///
/// Events are consumed one at a time into an in-memory tally per post. The
/// tally is written out on a fixed timer that runs independently of event
/// arrival, so a quiet site still gets its views persisted.
pub struct ViewCoalescer {
    files: StatsFiles,
    events: mpsc::Receiver<PostId>,
    flush_interval: Duration,
    tallies: HashMap<PostId, u64>,
}

impl ViewCoalescer {
    pub(crate) fn new(files: StatsFiles, events: mpsc::Receiver<PostId>, flush_interval: Duration) -> Self {
        Self {
            files,
            events,
            flush_interval,
            tallies: HashMap::new(),
        }
    }

    /// Count one view in memory.
    pub fn absorb(&mut self, id: PostId) {
        *self.tallies.entry(id).or_insert(0) += 1;
    }

    /// Views tallied but not yet written for `id`.
    pub fn pending(&self, id: PostId) -> u64 {
        self.tallies.get(&id).copied().unwrap_or(0)
    }

    /// Move every event already sitting in the queue into the tally.
    pub fn drain_queue(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(id) = self.events.try_recv() {
            self.absorb(id);
            drained += 1;
        }
        drained
    }

    /// Write all tallies to disk. Returns the number of records updated.
    ///
    /// Tallies whose write failed stay in memory for the next flush.
    pub async fn flush(&mut self) -> usize {
        if self.tallies.is_empty() {
            return 0;
        }

        let batch = std::mem::take(&mut self.tallies);
        let files = self.files.clone();
        let outcome = match tokio::task::spawn_blocking(move || files.apply_batch(batch)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "view flush task failed");
                return 0;
            }
        };

        for (id, count) in outcome.retry.iter().copied() {
            *self.tallies.entry(id).or_insert(0) += count;
        }

        debug!(
            written = outcome.written,
            retry = outcome.retry.len(),
            dropped = outcome.dropped,
            "view flush"
        );
        outcome.written
    }

    /// Run until shutdown is requested or every sender is gone, then drain
    /// the queue and flush one last time.
    pub async fn run(mut self, stop: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip the first immediate tick

        info!(interval_ms = self.flush_interval.as_millis() as u64, "view coalescer started");

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(id) => self.absorb(id),
                    None => break,
                },
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = stop.notified() => break,
            }
        }

        self.events.close();
        self.drain_queue();
        let written = self.flush().await;
        info!(written, unflushed = self.tallies.len(), "view coalescer stopped");
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self) -> CoalescerHandle {
        let stop = Arc::new(Notify::new());
        let task = tokio::spawn(self.run(Arc::clone(&stop)));
        CoalescerHandle { stop, task }
    }
}

/// Handle to a spawned [`ViewCoalescer`].
#[derive(Debug)]
pub struct CoalescerHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl CoalescerHandle {
    /// Ask the coalescer to flush and exit, and wait for it.
    pub async fn shutdown(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            error!(error = %e, "view coalescer terminated abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StatsStore;

    fn temp_store(config: CoalescerConfig) -> (tempfile::TempDir, StatsStore, ViewCoalescer) {
        let dir = tempfile::tempdir().unwrap();
        let (store, coalescer) = StatsStore::open(&dir.path().join("stats"), config).unwrap();
        (dir, store, coalescer)
    }

    #[tokio::test]
    async fn tallies_are_flushed_as_one_write_per_post() {
        let (_dir, store, mut coalescer) = temp_store(CoalescerConfig::default());
        let a = PostId::new(1);
        let b = PostId::new(2);
        store.init_stats(a).unwrap();
        store.init_stats(b).unwrap();

        for _ in 0..5 {
            store.record_view(a);
        }
        store.record_view(b);

        assert_eq!(coalescer.drain_queue(), 6);
        assert_eq!(coalescer.pending(a), 5);
        // Nothing is visible before the flush.
        assert_eq!(store.read_stats(a).unwrap().views, 0);

        assert_eq!(coalescer.flush().await, 2);
        assert_eq!(store.read_stats(a).unwrap().views, 5);
        assert_eq!(store.read_stats(b).unwrap().views, 1);
        assert_eq!(coalescer.pending(a), 0);
    }

    #[tokio::test]
    async fn failed_writes_are_retried() {
        let (_dir, store, mut coalescer) = temp_store(CoalescerConfig::default());
        let id = PostId::new(7);
        store.init_stats(id).unwrap();
        let path = store.files().path(id);
        let good = std::fs::read(&path).unwrap();
        std::fs::write(&path, b"not json").unwrap();

        coalescer.absorb(id);
        coalescer.absorb(id);
        assert_eq!(coalescer.flush().await, 0);
        assert_eq!(coalescer.pending(id), 2);

        std::fs::write(&path, good).unwrap();
        coalescer.absorb(id);
        assert_eq!(coalescer.flush().await, 1);
        assert_eq!(store.read_stats(id).unwrap().views, 3);
    }

    #[tokio::test]
    async fn views_for_unknown_posts_are_dropped() {
        let (_dir, _store, mut coalescer) = temp_store(CoalescerConfig::default());
        coalescer.absorb(PostId::new(99));
        assert_eq!(coalescer.flush().await, 0);
        assert_eq!(coalescer.pending(PostId::new(99)), 0);
    }

    #[tokio::test]
    async fn timer_flushes_without_further_events() {
        let config = CoalescerConfig {
            queue_capacity: 16,
            flush_interval: Duration::from_millis(20),
        };
        let (_dir, store, coalescer) = temp_store(config);
        let id = PostId::new(3);
        store.init_stats(id).unwrap();
        let handle = coalescer.spawn();

        for _ in 0..4 {
            store.record_view(id);
        }

        // No more events arrive; only the timer can persist the tally.
        let mut views = 0;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            views = store.read_stats(id).unwrap().views;
            if views == 4 {
                break;
            }
        }
        assert_eq!(views, 4);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_flushes_queued_views() {
        let config = CoalescerConfig {
            queue_capacity: 16,
            flush_interval: Duration::from_secs(3600),
        };
        let (_dir, store, coalescer) = temp_store(config);
        let id = PostId::new(5);
        store.init_stats(id).unwrap();
        let handle = coalescer.spawn();

        store.record_view(id);
        store.record_view(id);
        handle.shutdown().await;

        assert_eq!(store.read_stats(id).unwrap().views, 2);
    }

    #[tokio::test]
    async fn closing_the_queue_stops_the_coalescer() {
        let (_dir, store, coalescer) = temp_store(CoalescerConfig::default());
        let id = PostId::new(6);
        store.init_stats(id).unwrap();
        let files = store.files().clone();
        let handle = coalescer.spawn();

        store.record_view(id);
        drop(store);

        for _ in 0..200 {
            if handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.is_finished());
        assert_eq!(files.read(id).unwrap().views, 1);
    }
}
