use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use flatblog_comments::{CommentStore, FlushReport, FlusherHandle};
use flatblog_index::TimeIndex;
use flatblog_stats::{CoalescerHandle, StatsStore};
use flatblog_store::{PostError, PostStore};
use flatblog_types::{Comment, DataLayout, DayKey, NewPost, Page, Post, PostId, Stats};

use crate::config::BlogConfig;
use crate::error::{SdkError, SdkResult};

/// A blog opened over one data root.
///
/// Construction spawns the view coalescer and the comment flusher on the
/// current tokio runtime. Call [`shutdown`](Self::shutdown) before exiting so
/// buffered views and comments reach disk.
pub struct Blog {
    config: BlogConfig,
    layout: DataLayout,
    posts: Arc<PostStore>,
    stats: Arc<StatsStore>,
    comments: CommentStore,
    coalescer: CoalescerHandle,
    flusher: FlusherHandle,
}

impl Blog {
    pub async fn open(config: BlogConfig) -> SdkResult<Self> {
        let layout = config.layout();
        let index = TimeIndex::from_layout(&layout)?;
        let (stats, coalescer) = StatsStore::from_layout(&layout, config.coalescer())?;
        let stats = Arc::new(stats);
        let (comments, flusher) = CommentStore::from_layout(&layout, config.flusher())?;

        // The startup scan reads every post record.
        let scan_layout = layout.clone();
        let scan_stats = Arc::clone(&stats);
        let page_size = config.page_size;
        let posts = tokio::task::spawn_blocking(move || {
            PostStore::from_layout(&scan_layout, index, scan_stats).map(|s| s.with_page_size(page_size))
        })
        .await
        .map_err(|e| SdkError::Internal(e.to_string()))??;

        info!(root = %layout.root().display(), "blog opened");

        Ok(Self {
            config,
            layout,
            posts: Arc::new(posts),
            stats,
            comments,
            coalescer: coalescer.spawn(),
            flusher: flusher.spawn(),
        })
    }

    // ---- Posts ----

    pub fn create_post(&self, request: NewPost, author: &str) -> SdkResult<PostId> {
        Ok(self.posts.create_post(request, author)?)
    }

    /// Read any post, approved or not, counting a view.
    pub fn read_post(&self, raw_id: i64) -> SdkResult<Post> {
        Ok(self.posts.read_post(raw_id)?)
    }

    /// Read a post for public display. Unapproved posts are refused.
    pub fn open_post(&self, raw_id: i64) -> SdkResult<Post> {
        Ok(self.posts.read_published(raw_id)?)
    }

    /// `count` posts with consecutive ids from `from`, approved or not.
    /// Any missing id fails the whole read. No views are counted.
    pub fn get_posts(&self, from: i64, count: usize) -> SdkResult<Vec<Post>> {
        Ok(self.posts.get_posts(from, count)?)
    }

    pub fn list_recent_posts(&self, page: Page) -> SdkResult<Vec<Post>> {
        Ok(self.posts.list_recent_posts(page)?)
    }

    /// Approved posts of a `YYYY-MM-DD` day.
    pub fn posts_on_day(&self, day: &str) -> SdkResult<Vec<Post>> {
        Ok(self.posts.posts_on_day(DayKey::parse(day)?)?)
    }

    /// Approved posts of a `YYYY-MM-DD` day, most viewed first.
    pub fn top_posts_on_day(&self, day: &str) -> SdkResult<Vec<Post>> {
        Ok(self.posts.top_posts_on_day(DayKey::parse(day)?)?)
    }

    pub fn set_validity(&self, raw_id: i64, approved: bool) -> SdkResult<()> {
        Ok(self.posts.set_validity(raw_id, approved)?)
    }

    pub fn page_count(&self) -> usize {
        self.posts.page_count()
    }

    /// Days that have posts filed, oldest first.
    pub fn days(&self) -> SdkResult<Vec<DayKey>> {
        Ok(self.posts.time_index().days()?)
    }

    // ---- Stats ----

    pub fn read_stats(&self, raw_id: i64) -> SdkResult<Stats> {
        Ok(self.stats.read_stats(post_id(raw_id)?)?)
    }

    pub fn top_stats(&self, ids: &[PostId]) -> SdkResult<HashMap<PostId, Stats>> {
        Ok(self.stats.top_stats(ids)?)
    }

    // ---- Comments ----

    /// Buffer a comment on an existing post.
    pub fn submit_comment(&self, raw_id: i64, author: &str, content: &str) -> SdkResult<()> {
        let id = post_id(raw_id)?;
        if !self.posts.exists(id) {
            return Err(PostError::NotFound(id).into());
        }
        self.comments.submit(id, Comment::now(author, content));
        Ok(())
    }

    pub fn list_comments(&self, raw_id: i64) -> SdkResult<Vec<Comment>> {
        Ok(self.comments.list_comments(post_id(raw_id)?)?)
    }

    pub fn delete_comment(&self, raw_id: i64, position: usize) -> SdkResult<()> {
        Ok(self.comments.soft_delete(post_id(raw_id)?, position)?)
    }

    /// Persist buffered comments now instead of waiting for the flusher.
    pub async fn flush_comments(&self) -> SdkResult<FlushReport> {
        let comments = self.comments.clone();
        tokio::task::spawn_blocking(move || comments.flush_now())
            .await
            .map_err(|e| SdkError::Internal(e.to_string()))
    }

    // ---- Lifecycle ----

    /// Stop the background tasks after a final flush of views and comments.
    pub async fn shutdown(self) {
        self.flusher.shutdown().await;
        self.coalescer.shutdown().await;
        info!(root = %self.layout.root().display(), "blog closed");
    }

    pub fn config(&self) -> &BlogConfig {
        &self.config
    }

    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    pub fn posts(&self) -> &PostStore {
        &self.posts
    }

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }
}

fn post_id(raw_id: i64) -> SdkResult<PostId> {
    PostId::from_raw(raw_id).map_err(|_| PostError::NegativeId(raw_id).into())
}
