use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reader comment on a post.
///
/// `position` is reassigned every time the post's comment file is flushed,
/// so it only identifies a comment until the next flush.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub position: usize,
    pub author: String,
    pub content: String,
    /// Soft-delete marker. Deleted comments stay on disk but are never listed.
    #[serde(default)]
    pub deleted: bool,
    pub created: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: impl Into<String>, content: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            position: 0,
            author: author.into(),
            content: content.into(),
            deleted: false,
            created,
        }
    }

    /// A comment stamped with the current time.
    pub fn now(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(author, content, Utc::now())
    }

    pub fn is_visible(&self) -> bool {
        !self.deleted
    }
}
