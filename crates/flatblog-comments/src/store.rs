use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use flatblog_types::{Comment, DataLayout, PostId};

use crate::error::CommentResult;
use crate::files::CommentFiles;
use crate::flusher::{CommentFlusher, FlushReport, FlusherConfig};

type Buffer = HashMap<PostId, Vec<Comment>>;

struct Shared {
    files: CommentFiles,
    buffer: Mutex<Buffer>,
    /// Serializes rewrites of comment files between the flusher and
    /// moderation calls. Never held together with `buffer`.
    write_lock: Mutex<()>,
}

/// Per-post comment storage with buffered submission.
///
/// Cloning is cheap and yields a handle to the same buffer and files.
#[derive(Clone)]
pub struct CommentStore {
    shared: Arc<Shared>,
}

impl CommentStore {
    /// Open the store rooted at `dir` together with its flusher.
    pub fn open(dir: &Path, config: FlusherConfig) -> CommentResult<(Self, CommentFlusher)> {
        let files = CommentFiles::open(dir)?;
        let store = Self {
            shared: Arc::new(Shared {
                files,
                buffer: Mutex::new(HashMap::new()),
                write_lock: Mutex::new(()),
            }),
        };
        let flusher = CommentFlusher::new(store.clone(), config.flush_interval);
        Ok((store, flusher))
    }

    /// Open the comments namespace of a data root.
    pub fn from_layout(layout: &DataLayout, config: FlusherConfig) -> CommentResult<(Self, CommentFlusher)> {
        Self::open(&layout.comments_dir(), config)
    }

    /// Buffer a comment for `id`. It becomes readable after the next flush.
    pub fn submit(&self, id: PostId, comment: Comment) {
        self.buffer().entry(id).or_default().push(comment);
        trace!(%id, "comment buffered");
    }

    /// Persisted, non-deleted comments of `id` in stored order.
    pub fn list_comments(&self, id: PostId) -> CommentResult<Vec<Comment>> {
        let mut comments = self.shared.files.read_all(id)?;
        comments.retain(Comment::is_visible);
        Ok(comments)
    }

    /// Soft-delete the persisted comment at `position`.
    pub fn soft_delete(&self, id: PostId, position: usize) -> CommentResult<()> {
        let _guard = self.write_guard();
        self.shared.files.mark_deleted(id, position)
    }

    /// Comments of `id` waiting for the next flush.
    pub fn pending(&self, id: PostId) -> usize {
        self.buffer().get(&id).map_or(0, Vec::len)
    }

    /// Flush every buffered post now, on the calling thread.
    ///
    /// The buffer is swapped out under its lock and the lock released before
    /// any file is touched, so submissions continue during slow writes. A
    /// post whose write fails gets its comments put back for the next flush;
    /// other posts are unaffected.
    pub fn flush_now(&self) -> FlushReport {
        let snapshot = std::mem::take(&mut *self.buffer());
        let mut report = FlushReport::default();
        if snapshot.is_empty() {
            return report;
        }

        let mut posts: Vec<(PostId, Vec<Comment>)> = snapshot.into_iter().collect();
        posts.sort_by_key(|(id, _)| *id);

        for (id, comments) in posts {
            let result = {
                let _guard = self.write_guard();
                self.shared.files.merge(id, &comments)
            };
            match result {
                Ok(_) => {
                    report.posts_written += 1;
                    report.comments_written += comments.len();
                }
                Err(e) => {
                    warn!(%id, count = comments.len(), error = %e, "comment flush failed; will retry");
                    report.posts_failed += 1;
                    self.requeue(id, comments);
                }
            }
        }
        report
    }

    pub fn files(&self) -> &CommentFiles {
        &self.shared.files
    }

    /// Put `comments` back ahead of anything submitted since the snapshot.
    fn requeue(&self, id: PostId, mut comments: Vec<Comment>) {
        let mut buffer = self.buffer();
        let slot = buffer.entry(id).or_default();
        comments.append(slot);
        *slot = comments;
    }

    fn buffer(&self) -> MutexGuard<'_, Buffer> {
        self.shared
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.shared
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CommentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buffered = self.buffer().values().map(Vec::len).sum::<usize>();
        f.debug_struct("CommentStore")
            .field("files", &self.shared.files)
            .field("buffered", &buffered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommentError;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use std::thread;

    fn at(secs: i64, content: &str) -> Comment {
        Comment::new("reader", content, Utc.timestamp_opt(secs, 0).unwrap())
    }

    fn temp_store() -> (tempfile::TempDir, CommentStore) {
        let dir = tempfile::tempdir().unwrap();
        let (store, _flusher) =
            CommentStore::open(&dir.path().join("comments"), FlusherConfig::default()).unwrap();
        (dir, store)
    }

    fn contents(comments: &[Comment]) -> Vec<String> {
        comments.iter().map(|c| c.content.clone()).collect()
    }

    #[test]
    fn submissions_are_invisible_until_flushed() {
        let (_dir, store) = temp_store();
        let id = PostId::new(1);
        store.submit(id, at(1, "hello"));

        assert_eq!(store.pending(id), 1);
        assert!(matches!(store.list_comments(id), Err(CommentError::NotFound(_))));

        let report = store.flush_now();
        assert_eq!(report.posts_written, 1);
        assert_eq!(report.comments_written, 1);
        assert_eq!(store.pending(id), 0);
        assert_eq!(contents(&store.list_comments(id).unwrap()), ["hello"]);
    }

    #[test]
    fn later_flush_merges_by_creation_time() {
        let (_dir, store) = temp_store();
        let id = PostId::new(2);

        store.submit(id, at(1, "c1"));
        store.submit(id, at(2, "c2"));
        store.flush_now();
        store.submit(id, at(0, "c3"));
        store.flush_now();

        let listed = store.list_comments(id).unwrap();
        assert_eq!(contents(&listed), ["c3", "c1", "c2"]);
        let positions: Vec<usize> = listed.iter().map(|c| c.position).collect();
        assert_eq!(positions, [0, 1, 2]);
    }

    #[test]
    fn deleted_comments_are_hidden_but_retained() {
        let (_dir, store) = temp_store();
        let id = PostId::new(3);
        let mut hidden = at(2, "spam");
        hidden.deleted = true;

        store.submit(id, at(1, "kept"));
        store.submit(id, hidden);
        store.submit(id, at(3, "also kept"));
        store.flush_now();

        assert_eq!(contents(&store.list_comments(id).unwrap()), ["kept", "also kept"]);
        assert_eq!(store.files().read_all(id).unwrap().len(), 3);

        store.soft_delete(id, 0).unwrap();
        assert_eq!(contents(&store.list_comments(id).unwrap()), ["also kept"]);
        assert_eq!(store.files().read_all(id).unwrap().len(), 3);
    }

    #[test]
    fn failed_post_is_retried_without_blocking_others() {
        let (_dir, store) = temp_store();
        let bad = PostId::new(4);
        let good = PostId::new(5);
        fs::write(store.files().path(bad), b"{broken").unwrap();

        store.submit(bad, at(1, "waiting"));
        store.submit(good, at(1, "fine"));
        let report = store.flush_now();

        assert_eq!(report.posts_written, 1);
        assert_eq!(report.posts_failed, 1);
        assert_eq!(contents(&store.list_comments(good).unwrap()), ["fine"]);
        assert_eq!(store.pending(bad), 1);

        // Newer submissions queue behind the retried ones.
        store.submit(bad, at(2, "newer"));
        fs::remove_file(store.files().path(bad)).unwrap();
        store.flush_now();
        assert_eq!(contents(&store.list_comments(bad).unwrap()), ["waiting", "newer"]);
        assert_eq!(store.pending(bad), 0);
    }

    #[test]
    fn concurrent_submissions_are_all_kept() {
        let (_dir, store) = temp_store();
        let id = PostId::new(6);

        let mut handles = Vec::new();
        for t in 0..4i64 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for i in 0..25 {
                    store.submit(id, at(t * 100 + i, "x"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.pending(id), 100);
        store.flush_now();
        assert_eq!(store.list_comments(id).unwrap().len(), 100);
    }

    #[test]
    fn empty_flush_writes_nothing() {
        let (_dir, store) = temp_store();
        assert_eq!(store.flush_now(), FlushReport::default());
        assert!(fs::read_dir(store.files().path(PostId::new(0)).parent().unwrap())
            .unwrap()
            .next()
            .is_none());
    }
}
