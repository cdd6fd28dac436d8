use std::path::PathBuf;

use flatblog_types::DayKey;

/// Errors from time-index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The day file length is not a whole number of entries.
    #[error("corrupt time index {path}: length {len} is not a multiple of {width}")]
    Corruption { path: PathBuf, len: u64, width: usize },

    /// The day file could not be opened or appended to.
    #[error("cannot append to time index for {day}: {source}")]
    Append {
        day: DayKey,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for time-index operations.
pub type IndexResult<T> = Result<T, IndexError>;
