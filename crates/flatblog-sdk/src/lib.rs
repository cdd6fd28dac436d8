//! High-level flatblog API.
//!
//! [`Blog`] is the entry point for anything embedding flatblog, such as an
//! HTTP front end or the `flatblog` CLI. It opens every store under one data
//! root, runs the view coalescer and comment flusher in the background, and
//! maps storage errors onto client and server errors at the boundary.

pub mod blog;
pub mod config;
pub mod error;

pub use blog::Blog;
pub use config::BlogConfig;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use flatblog_comments::FlushReport;
pub use flatblog_types::{Comment, DataLayout, DayKey, NewPost, Page, Post, PostId, Stats};
