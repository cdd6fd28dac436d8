use flatblog_index::IndexError;
use flatblog_stats::StatsError;
use flatblog_types::{DayKey, PostId};

/// Errors from post storage operations.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    /// No post is stored under the identifier.
    #[error("post not found: {0}")]
    NotFound(PostId),

    /// A negative identifier was supplied; it can never name a post.
    #[error("post not found: {0}")]
    NegativeId(i64),

    /// The post exists but has not been approved for publication.
    #[error("post {0} is not published")]
    Hidden(PostId),

    /// A record already exists at a freshly allocated identifier.
    #[error("post {0} already exists on disk")]
    AlreadyExists(PostId),

    /// Every identifier up to `last` has been handed out.
    #[error("post identifiers exhausted after {last}")]
    IdsExhausted { last: PostId },

    /// The post was written but could not be filed in the time index.
    #[error("post {id} could not be filed under {day}: {source}")]
    IndexConflict {
        id: PostId,
        day: DayKey,
        #[source]
        source: IndexError,
    },

    /// A post record could not be decoded.
    #[error("corrupt post record {id}: {reason}")]
    Corruption { id: PostId, reason: String },

    #[error("time index error: {0}")]
    Index(#[from] IndexError),

    #[error("stats error: {0}")]
    Stats(#[from] StatsError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("directory scan failed: {0}")]
    Scan(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PostError {
    /// Whether the error means "no such post" rather than a storage fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::NegativeId(_))
    }
}

/// Result alias for post storage operations.
pub type PostResult<T> = Result<T, PostError>;
