use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flatblog_types::{record, Post, PostId};

use crate::error::{PostError, PostResult};

/// Direct file access to the `posts/` namespace.
#[derive(Clone, Debug)]
pub struct PostFiles {
    dir: PathBuf,
}

impl PostFiles {
    pub fn open(dir: &Path) -> PostResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: PostId) -> PathBuf {
        self.dir.join(id.to_string())
    }

    /// Write a brand new record. Fails with [`PostError::AlreadyExists`]
    /// rather than overwrite.
    pub fn create(&self, post: &Post) -> PostResult<()> {
        let bytes = encode(post)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.path(post.id))
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => PostError::AlreadyExists(post.id),
                _ => PostError::Io(e),
            })?;
        file.write_all(&bytes)?;
        Ok(())
    }

    pub fn read(&self, id: PostId) -> PostResult<Post> {
        let bytes = fs::read(self.path(id)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PostError::NotFound(id),
            _ => PostError::Io(e),
        })?;
        record::decode(&bytes).map_err(|e| PostError::Corruption {
            id,
            reason: e.to_string(),
        })
    }

    /// Replace an existing record in full. Concurrent readers see either
    /// the old record or the new one.
    pub fn rewrite(&self, post: &Post) -> PostResult<()> {
        let path = self.path(post.id);
        if !path.is_file() {
            return Err(PostError::NotFound(post.id));
        }
        record::replace(&path, &encode(post)?)?;
        Ok(())
    }
}

fn encode(post: &Post) -> PostResult<Vec<u8>> {
    record::encode(post).map_err(|e| PostError::Serialization(e.to_string()))
}
