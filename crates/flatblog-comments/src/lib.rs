//! Comments for flatblog.
//!
//! Submitted comments land in an in-memory buffer keyed by post. Once per
//! flush interval the [`CommentFlusher`] takes the whole buffer, and for each
//! post merges the new comments with the ones already on disk, orders them
//! by creation time, renumbers their positions from zero and rewrites the
//! post's comment file in full.
//!
//! Positions are therefore only stable between two flushes. Deleted comments
//! are kept in the file with their `deleted` flag set and hidden from reads.

pub mod error;
pub mod files;
pub mod flusher;
pub mod store;

pub use error::{CommentError, CommentResult};
pub use files::CommentFiles;
pub use flusher::{CommentFlusher, FlushReport, FlusherConfig, FlusherHandle};
pub use store::CommentStore;
