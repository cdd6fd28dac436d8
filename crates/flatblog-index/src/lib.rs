//! By-day time index for flatblog.
//!
//! Every calendar day with at least one post owns a file under
//! `posts-index/bytime/` named `YYYY-MM-DD`. The file is a flat sequence of
//! 8-byte big-endian post identifiers in append order:
//!
//! ```text
//! [8 bytes: id][8 bytes: id][8 bytes: id]...
//! ```
//!
//! Files are only ever appended to. There is no header, no checksum and no
//! compaction; a length that is not a multiple of 8 means the file is
//! corrupt.

pub mod error;
pub mod time_index;

pub use error::{IndexError, IndexResult};
pub use time_index::TimeIndex;
