//! Foundation types for flatblog.
//!
//! flatblog keeps posts, view counters and comments as plain files under a
//! single data root. This crate holds the entities shared by every store
//! crate plus the path arithmetic that maps them onto the filesystem.
//!
//! # Key Types
//!
//! - [`PostId`]: dense, monotonically allocated post identifier
//! - [`Post`] / [`NewPost`]: a persisted post and its creation payload
//! - [`Stats`]: per-post view counter
//! - [`Comment`]: a reader comment, repositioned on every flush
//! - [`DayKey`]: calendar day used as the time-index key
//! - [`Page`]: zero-based pagination index
//! - [`DataLayout`]: on-disk layout of the data root

pub mod comment;
pub mod day;
pub mod error;
pub mod id;
pub mod layout;
pub mod page;
pub mod post;
pub mod record;

pub use comment::Comment;
pub use day::DayKey;
pub use error::TypeError;
pub use id::PostId;
pub use layout::DataLayout;
pub use page::Page;
pub use post::{NewPost, Post, Stats};
