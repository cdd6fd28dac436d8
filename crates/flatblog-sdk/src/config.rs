use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use flatblog_comments::FlusherConfig;
use flatblog_stats::CoalescerConfig;
use flatblog_types::DataLayout;

use crate::error::{SdkError, SdkResult};

/// Runtime configuration of a [`Blog`](crate::Blog).
///
/// Loaded from TOML; every key is optional and falls back to its default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    /// Directory holding `posts/`, `posts-index/`, `stats/` and `comments/`.
    pub data_root: PathBuf,
    /// Posts per listing page.
    pub page_size: usize,
    /// Views that may wait for the coalescer before new ones are dropped.
    pub view_queue_capacity: usize,
    pub view_flush_secs: u64,
    pub comment_flush_ms: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            page_size: 5,
            view_queue_capacity: 1000,
            view_flush_secs: 60,
            comment_flush_ms: 1000,
        }
    }
}

impl BlogConfig {
    /// Defaults with the given data root.
    pub fn with_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(input: &str) -> SdkResult<Self> {
        toml::from_str(input).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_root)
    }

    pub fn coalescer(&self) -> CoalescerConfig {
        CoalescerConfig {
            queue_capacity: self.view_queue_capacity.max(1),
            flush_interval: Duration::from_secs(self.view_flush_secs.max(1)),
        }
    }

    pub fn flusher(&self) -> FlusherConfig {
        FlusherConfig {
            flush_interval: Duration::from_millis(self.comment_flush_ms.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = BlogConfig::default();
        assert_eq!(c.data_root, PathBuf::from("data"));
        assert_eq!(c.page_size, 5);
        assert_eq!(c.view_queue_capacity, 1000);
        assert_eq!(c.coalescer().flush_interval, Duration::from_secs(60));
        assert_eq!(c.flusher().flush_interval, Duration::from_secs(1));
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let c = BlogConfig::from_toml_str("data_root = \"/srv/blog\"\npage_size = 10\n").unwrap();
        assert_eq!(c.data_root, PathBuf::from("/srv/blog"));
        assert_eq!(c.page_size, 10);
        assert_eq!(c.view_flush_secs, 60);
        assert_eq!(c.comment_flush_ms, 1000);

        assert_eq!(BlogConfig::from_toml_str("").unwrap(), BlogConfig::default());
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = BlogConfig::from_toml_str("page_size = \"five\"").unwrap_err();
        assert!(matches!(err, SdkError::Config(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flatblog.toml");
        std::fs::write(&path, "view_queue_capacity = 3\ncomment_flush_ms = 0\n").unwrap();

        let c = BlogConfig::load(&path).unwrap();
        assert_eq!(c.coalescer().queue_capacity, 3);
        assert_eq!(c.flusher().flush_interval, Duration::from_millis(1));

        assert!(BlogConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn layout_follows_data_root() {
        let c = BlogConfig::with_root("/tmp/x");
        assert_eq!(c.layout().posts_dir(), PathBuf::from("/tmp/x/posts"));
    }
}
