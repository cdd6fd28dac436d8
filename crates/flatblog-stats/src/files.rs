use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use flatblog_types::{record, PostId, Stats};

use crate::error::{StatsError, StatsResult};

/// Direct file access to the `stats/` namespace.
///
/// Cheap to clone; the store and the coalescer each hold one.
#[derive(Clone, Debug)]
pub struct StatsFiles {
    dir: PathBuf,
}

/// Outcome of applying one coalesced batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records updated successfully.
    pub written: usize,
    /// Tallies that must be retried on the next flush.
    pub retry: Vec<(PostId, u64)>,
    /// Tallies discarded because the post has no stats record.
    pub dropped: usize,
}

impl StatsFiles {
    pub fn open(dir: &Path) -> StatsResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self, id: PostId) -> PathBuf {
        self.dir.join(id.to_string())
    }

    /// Create a zeroed record. Fails if one already exists.
    pub fn create(&self, id: PostId) -> StatsResult<()> {
        let bytes = encode(&Stats::zero(id))?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(id))
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => StatsError::AlreadyExists(id),
                _ => StatsError::Io(e),
            })?;
        file.write_all(&bytes)?;
        Ok(())
    }

    pub fn read(&self, id: PostId) -> StatsResult<Stats> {
        let bytes = fs::read(self.path(id)).map_err(|e| not_found_or_io(id, e))?;
        decode(id, &bytes)
    }

    /// Add `count` views to the persisted counter. The record is replaced
    /// rather than truncated, so concurrent reads never see it half written.
    pub fn add_views(&self, id: PostId, count: u64) -> StatsResult<Stats> {
        let mut stats = self.read(id)?;
        stats.add_views(count);
        record::replace(&self.path(id), &encode(&stats)?)?;

        debug!(%id, added = count, total = stats.views, "views persisted");
        Ok(stats)
    }

    /// Apply a whole tally map, one file update per post.
    ///
    /// A failure for one post never stops the others.
    pub fn apply_batch(&self, batch: impl IntoIterator<Item = (PostId, u64)>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (id, count) in batch {
            match self.add_views(id, count) {
                Ok(_) => outcome.written += 1,
                Err(StatsError::NotFound(_)) => {
                    warn!(%id, count, "dropping views for post without stats record");
                    outcome.dropped += 1;
                }
                Err(e) => {
                    warn!(%id, count, error = %e, "failed to persist views; will retry");
                    outcome.retry.push((id, count));
                }
            }
        }
        outcome
    }
}

fn not_found_or_io(id: PostId, e: io::Error) -> StatsError {
    match e.kind() {
        io::ErrorKind::NotFound => StatsError::NotFound(id),
        _ => StatsError::Io(e),
    }
}

fn encode(stats: &Stats) -> StatsResult<Vec<u8>> {
    record::encode(stats).map_err(|e| StatsError::Serialization(e.to_string()))
}

fn decode(id: PostId, bytes: &[u8]) -> StatsResult<Stats> {
    record::decode(bytes).map_err(|e| StatsError::Corruption {
        id,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn temp_files() -> (tempfile::TempDir, StatsFiles) {
        let dir = tempfile::tempdir().unwrap();
        let files = StatsFiles::open(&dir.path().join("stats")).unwrap();
        (dir, files)
    }

    #[test]
    fn create_is_exactly_once() {
        let (_dir, files) = temp_files();
        files.create(PostId::new(1)).unwrap();
        let err = files.create(PostId::new(1)).unwrap_err();
        assert!(matches!(err, StatsError::AlreadyExists(id) if id == PostId::new(1)));
    }

    #[test]
    fn add_views_accumulates() {
        let (_dir, files) = temp_files();
        let id = PostId::new(2);
        files.create(id).unwrap();
        files.add_views(id, 3).unwrap();
        let stats = files.add_views(id, 4).unwrap();
        assert_eq!(stats.views, 7);
        assert_eq!(files.read(id).unwrap(), Stats { id, views: 7 });
    }

    #[test]
    fn rewrite_shrinks_file_cleanly() {
        let (_dir, files) = temp_files();
        let id = PostId::new(3);
        // A long, padded record must not leave trailing bytes after rewrite.
        fs::write(files.path(id), br#"{ "id" : 3 ,   "views" :   10   }"#).unwrap();
        files.add_views(id, 1).unwrap();
        assert_eq!(files.read(id).unwrap().views, 11);
    }

    #[test]
    fn missing_record_is_not_found() {
        let (_dir, files) = temp_files();
        assert!(matches!(files.read(PostId::new(9)), Err(StatsError::NotFound(_))));
        assert!(matches!(files.add_views(PostId::new(9), 1), Err(StatsError::NotFound(_))));
    }

    #[test]
    fn malformed_record_is_corruption() {
        let (_dir, files) = temp_files();
        fs::write(files.path(PostId::new(4)), b"{\"id\":4,").unwrap();
        assert!(matches!(files.read(PostId::new(4)), Err(StatsError::Corruption { .. })));
    }

    #[test]
    fn batch_isolates_failures() {
        let (_dir, files) = temp_files();
        files.create(PostId::new(1)).unwrap();
        fs::write(files.path(PostId::new(2)), b"garbage").unwrap();

        let outcome = files.apply_batch([
            (PostId::new(1), 5),
            (PostId::new(2), 6),
            (PostId::new(3), 7),
        ]);

        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.retry, vec![(PostId::new(2), 6)]);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(files.read(PostId::new(1)).unwrap().views, 5);
    }

    #[test]
    fn reads_during_flushes_never_fail() {
        let (_dir, files) = temp_files();
        let files = Arc::new(files);
        let id = PostId::new(5);
        files.create(id).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let writer = {
            let files = Arc::clone(&files);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for _ in 0..300 {
                    files.add_views(id, 1).unwrap();
                }
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut last = 0;
        while !done.load(Ordering::SeqCst) {
            let views = files.read(id).unwrap().views;
            assert!(views >= last);
            last = views;
        }
        writer.join().unwrap();
        assert_eq!(files.read(id).unwrap().views, 300);
    }
}
