use std::collections::HashMap;
use std::path::Path;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use flatblog_types::{DataLayout, PostId, Stats};

use crate::coalescer::{CoalescerConfig, ViewCoalescer};
use crate::error::StatsResult;
use crate::files::StatsFiles;

/// Per-post view counters.
///
/// Reads and initialization go straight to disk. Views are queued for the
/// [`ViewCoalescer`] returned by [`StatsStore::open`], which the caller is
/// responsible for running.
#[derive(Debug)]
pub struct StatsStore {
    files: StatsFiles,
    views: mpsc::Sender<PostId>,
}

impl StatsStore {
    /// Open the store rooted at `dir` together with its coalescer.
    pub fn open(dir: &Path, config: CoalescerConfig) -> StatsResult<(Self, ViewCoalescer)> {
        let files = StatsFiles::open(dir)?;
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let coalescer = ViewCoalescer::new(files.clone(), rx, config.flush_interval);
        Ok((Self { files, views: tx }, coalescer))
    }

    /// Open the stats namespace of a data root.
    pub fn from_layout(layout: &DataLayout, config: CoalescerConfig) -> StatsResult<(Self, ViewCoalescer)> {
        Self::open(&layout.stats_dir(), config)
    }

    /// Create the zeroed counter of a new post. Must be called once per post.
    pub fn init_stats(&self, id: PostId) -> StatsResult<()> {
        self.files.create(id)
    }

    /// Queue one view of `id`. Never blocks and never fails; when the queue
    /// is full the view is dropped.
    pub fn record_view(&self, id: PostId) {
        match self.views.try_send(id) {
            Ok(()) => trace!(%id, "view queued"),
            Err(TrySendError::Full(id)) => warn!(%id, "view queue full; dropping view"),
            Err(TrySendError::Closed(id)) => warn!(%id, "view coalescer gone; dropping view"),
        }
    }

    /// The persisted counter of `id`. Views still queued are not included.
    pub fn read_stats(&self, id: PostId) -> StatsResult<Stats> {
        self.files.read(id)
    }

    /// Counters for every id in `ids`. Fails as a whole if any one fails.
    pub fn top_stats(&self, ids: &[PostId]) -> StatsResult<HashMap<PostId, Stats>> {
        ids.iter()
            .map(|&id| self.files.read(id).map(|stats| (id, stats)))
            .collect()
    }

    pub fn files(&self) -> &StatsFiles {
        &self.files
    }
}
