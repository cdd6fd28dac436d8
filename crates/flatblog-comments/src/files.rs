use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use flatblog_types::{record, Comment, PostId};

use crate::error::{CommentError, CommentResult};

/// Direct file access to the `comments/` namespace.
///
/// Each post's comments live in one JSON array that is always rewritten in
/// full.
#[derive(Clone, Debug)]
pub struct CommentFiles {
    dir: PathBuf,
}

impl CommentFiles {
    pub fn open(dir: &Path) -> CommentResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path(&self, id: PostId) -> PathBuf {
        self.dir.join(id.to_string())
    }

    /// Every persisted comment of `id`, deleted ones included.
    pub fn read_all(&self, id: PostId) -> CommentResult<Vec<Comment>> {
        let bytes = fs::read(self.path(id)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CommentError::NotFound(id),
            _ => CommentError::Io(e),
        })?;
        self.decode(id, &bytes)
    }

    /// Merge `incoming` into the persisted comments of `id`.
    ///
    /// The combined list is ordered by creation time (persisted comments
    /// first on ties), renumbered from zero and written back in full.
    /// Returns the number of comments now stored.
    pub fn merge(&self, id: PostId, incoming: &[Comment]) -> CommentResult<usize> {
        let mut comments = match fs::read(self.path(id)) {
            Ok(bytes) if bytes.is_empty() => Vec::new(),
            Ok(bytes) => self.decode(id, &bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        comments.extend_from_slice(incoming);
        comments.sort_by_key(|c| c.created);
        for (position, comment) in comments.iter_mut().enumerate() {
            comment.position = position;
        }

        self.write_all(id, &comments)?;
        debug!(%id, added = incoming.len(), total = comments.len(), "comments merged");
        Ok(comments.len())
    }

    /// Set the deleted flag of the comment at `position`.
    pub fn mark_deleted(&self, id: PostId, position: usize) -> CommentResult<()> {
        let mut comments = self.read_all(id)?;
        let comment = comments
            .iter_mut()
            .find(|c| c.position == position)
            .ok_or(CommentError::PositionNotFound { id, position })?;
        if comment.deleted {
            return Ok(());
        }
        comment.deleted = true;
        self.write_all(id, &comments)
    }

    fn write_all(&self, id: PostId, comments: &[Comment]) -> CommentResult<()> {
        let bytes = record::encode(&comments).map_err(|e| CommentError::Serialization(e.to_string()))?;
        record::replace(&self.path(id), &bytes)?;
        Ok(())
    }

    fn decode(&self, id: PostId, bytes: &[u8]) -> CommentResult<Vec<Comment>> {
        record::decode(bytes).map_err(|e| CommentError::Corruption {
            id,
            reason: e.to_string(),
        })
    }
}
