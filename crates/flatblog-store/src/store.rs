use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use flatblog_index::TimeIndex;
use flatblog_stats::StatsStore;
use flatblog_types::{DataLayout, DayKey, NewPost, Page, Post, PostId};

use crate::error::{PostError, PostResult};
use crate::files::PostFiles;
use crate::validity::ValiditySet;

/// Posts shown per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// The post store.
///
/// Owns the post records and keeps the time index and view counters in step
/// with them. Every method takes `&self`; the store is meant to be shared
/// behind an `Arc`.
#[derive(Debug)]
pub struct PostStore {
    files: PostFiles,
    index: TimeIndex,
    stats: Arc<StatsStore>,
    /// Highest identifier ever handed out, `None` before the first post.
    last_id: Mutex<Option<PostId>>,
    validity: RwLock<ValiditySet>,
    /// Serializes approval changes so the record and the set agree.
    moderation: Mutex<()>,
    page_size: usize,
}

impl PostStore {
    /// Open the store over `dir`, scanning existing records.
    pub fn open(dir: &Path, index: TimeIndex, stats: Arc<StatsStore>) -> PostResult<Self> {
        let files = PostFiles::open(dir)?;
        let (last_id, validity) = scan(&files)?;

        info!(
            dir = %dir.display(),
            last_id = ?last_id,
            approved = validity.len(),
            "post store opened"
        );

        Ok(Self {
            files,
            index,
            stats,
            last_id: Mutex::new(last_id),
            validity: RwLock::new(validity),
            moderation: Mutex::new(()),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn from_layout(layout: &DataLayout, index: TimeIndex, stats: Arc<StatsStore>) -> PostResult<Self> {
        Self::open(&layout.posts_dir(), index, stats)
    }

    /// Override the listing page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create a post stamped with the current time.
    pub fn create_post(&self, request: NewPost, author: &str) -> PostResult<PostId> {
        self.create_post_at(request, author, Utc::now())
    }

    /// Create a post with an explicit creation time.
    ///
    /// The identifier is consumed as soon as it is allocated. If a later
    /// step fails, the steps already done stay on disk and the error is
    /// returned.
    pub fn create_post_at(&self, request: NewPost, author: &str, created: DateTime<Utc>) -> PostResult<PostId> {
        let id = self.allocate()?;
        let post = Post::new(id, request, author, created);
        let day = post.day();

        self.files.create(&post)?;
        self.index
            .append(id, day)
            .map_err(|source| PostError::IndexConflict { id, day, source })?;
        self.stats.init_stats(id)?;

        info!(%id, %day, author, "post created");
        Ok(id)
    }

    fn allocate(&self) -> PostResult<PostId> {
        let mut last = self.last_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = match *last {
            None => PostId::FIRST,
            Some(prev) => prev.next().ok_or(PostError::IdsExhausted { last: prev })?,
        };
        *last = Some(id);
        Ok(id)
    }

    /// Read one post and count a view of it.
    pub fn read_post(&self, raw_id: i64) -> PostResult<Post> {
        let post = self.files.read(to_id(raw_id)?)?;
        self.stats.record_view(post.id);
        Ok(post)
    }

    /// Like [`read_post`](Self::read_post), but only for approved posts.
    /// Unapproved posts yield [`PostError::Hidden`] and are not counted.
    pub fn read_published(&self, raw_id: i64) -> PostResult<Post> {
        let post = self.files.read(to_id(raw_id)?)?;
        if !post.approved {
            return Err(PostError::Hidden(post.id));
        }
        self.stats.record_view(post.id);
        Ok(post)
    }

    /// Whether a record is stored under `id`. Does not count a view.
    pub fn exists(&self, id: PostId) -> bool {
        self.files.path(id).is_file()
    }

    /// `count` posts with consecutive identifiers starting at `from`,
    /// approved or not. Fails on the first identifier with no record and
    /// does not count views.
    pub fn get_posts(&self, from: i64, count: usize) -> PostResult<Vec<Post>> {
        let first = to_id(from)?.get();
        let end = first.saturating_add(u64::try_from(count).unwrap_or(u64::MAX));
        (first..end).map(|raw| self.files.read(PostId::new(raw))).collect()
    }

    /// Approved posts on `page`, newest first. Pages past the end are empty.
    pub fn list_recent_posts(&self, page: Page) -> PostResult<Vec<Post>> {
        let ids = self.read_validity().newest_first(page.index(), self.page_size);
        ids.into_iter().map(|id| self.files.read(id)).collect()
    }

    /// Approved posts filed under `day`, in the order they were filed.
    pub fn posts_on_day(&self, day: DayKey) -> PostResult<Vec<Post>> {
        let ids = self.index.ids_on_day(day)?;
        let mut posts = Vec::with_capacity(ids.len());
        for id in ids {
            let post = self.files.read(id)?;
            if post.is_visible() {
                posts.push(post);
            }
        }
        Ok(posts)
    }

    /// Approved posts on `day` with their counters, most viewed first.
    pub fn top_posts_on_day(&self, day: DayKey) -> PostResult<Vec<Post>> {
        let mut posts = self.posts_on_day(day)?;
        let ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();
        let stats = self.stats.top_stats(&ids)?;

        for post in &mut posts {
            post.stats = stats.get(&post.id).copied();
        }
        // stable: equal counts keep index order
        posts.sort_by(|a, b| b.views().cmp(&a.views()));
        Ok(posts)
    }

    /// Approve or revoke a post.
    pub fn set_validity(&self, raw_id: i64, approved: bool) -> PostResult<()> {
        let id = to_id(raw_id)?;
        let _guard = self.moderation.lock().unwrap_or_else(PoisonError::into_inner);

        let mut post = self.files.read(id)?;
        if post.approved != approved {
            post.approved = approved;
            self.files.rewrite(&post)?;
        }

        let mut validity = self.validity.write().unwrap_or_else(PoisonError::into_inner);
        if approved {
            validity.insert(id);
        } else {
            validity.remove(id);
        }

        info!(%id, approved, "post validity updated");
        Ok(())
    }

    /// Number of listing pages, at least one.
    pub fn page_count(&self) -> usize {
        Page::count(self.approved_count(), self.page_size)
    }

    pub fn approved_count(&self) -> usize {
        self.read_validity().len()
    }

    pub fn last_id(&self) -> Option<PostId> {
        *self.last_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the approved identifiers, ascending.
    pub fn approved_ids(&self) -> Vec<PostId> {
        self.read_validity().as_slice().to_vec()
    }

    pub fn stats(&self) -> &Arc<StatsStore> {
        &self.stats
    }

    pub fn time_index(&self) -> &TimeIndex {
        &self.index
    }

    fn read_validity(&self) -> std::sync::RwLockReadGuard<'_, ValiditySet> {
        self.validity.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn to_id(raw_id: i64) -> PostResult<PostId> {
    PostId::from_raw(raw_id).map_err(|_| PostError::NegativeId(raw_id))
}

/// Walk the post directory once, returning the highest identifier seen and
/// the approved set.
fn scan(files: &PostFiles) -> PostResult<(Option<PostId>, ValiditySet)> {
    let mut last_id: Option<PostId> = None;
    let mut approved = Vec::new();
    let mut scanned = 0usize;

    for entry in WalkDir::new(files.dir()).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        let id = match name.parse::<PostId>() {
            Ok(id) if id.to_string() == name => id,
            _ => {
                debug!(name = %name, "ignoring non-post file");
                continue;
            }
        };

        scanned += 1;
        last_id = last_id.max(Some(id));

        match files.read(id) {
            Ok(post) if post.approved => approved.push(id),
            Ok(_) => {}
            Err(e) => warn!(%id, error = %e, "unreadable post record left out of listings"),
        }
    }

    debug!(scanned, "post directory scanned");
    Ok((last_id, approved.into_iter().collect()))
}
