use std::path::{Path, PathBuf};

const POSTS_DIR: &str = "posts";
const TIME_INDEX_DIR: &str = "posts-index/bytime";
const STATS_DIR: &str = "stats";
const COMMENTS_DIR: &str = "comments";

/// On-disk layout of a flatblog data root.
///
/// ```text
/// <root>/posts/<id>
/// <root>/posts-index/bytime/<YYYY-MM-DD>
/// <root>/stats/<id>
/// <root>/comments/<id>
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.root.join(POSTS_DIR)
    }

    pub fn time_index_dir(&self) -> PathBuf {
        self.root.join(TIME_INDEX_DIR)
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.root.join(STATS_DIR)
    }

    pub fn comments_dir(&self) -> PathBuf {
        self.root.join(COMMENTS_DIR)
    }
}
