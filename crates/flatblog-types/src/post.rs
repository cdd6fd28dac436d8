use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::day::DayKey;
use crate::id::PostId;

/// Payload of a post creation request.
///
/// The author is resolved by the caller and passed separately.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub body: String,
}

/// A persisted post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    /// Short body shown in listings.
    pub summary: String,
    /// Full body.
    pub body: String,
    /// Display name of the author.
    pub author: String,
    pub created: DateTime<Utc>,
    /// Only populated by the top-of-day read path; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    /// Moderation flag. New posts start unapproved.
    #[serde(default)]
    pub approved: bool,
}

impl Post {
    pub fn new(id: PostId, request: NewPost, author: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title: request.title,
            summary: request.summary,
            body: request.body,
            author: author.into(),
            created,
            stats: None,
            approved: false,
        }
    }

    /// Whether the post may appear in public reads and listings.
    pub fn is_visible(&self) -> bool {
        self.approved
    }

    /// Day under which the post is filed in the time index.
    pub fn day(&self) -> DayKey {
        DayKey::of(&self.created)
    }

    /// Views from the embedded stats snapshot, zero when absent.
    pub fn views(&self) -> u64 {
        self.stats.map_or(0, |s| s.views)
    }
}

/// View counter of a single post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stats {
    pub id: PostId,
    pub views: u64,
}

impl Stats {
    pub fn zero(id: PostId) -> Self {
        Self { id, views: 0 }
    }

    /// Add a coalesced batch of views. Saturates rather than wrapping.
    pub fn add_views(&mut self, count: u64) {
        self.views = self.views.saturating_add(count);
    }
}
