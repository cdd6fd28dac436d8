use flatblog_types::PostId;

/// Errors from stats operations.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    /// No stats record exists for the post.
    #[error("stats not found for post {0}")]
    NotFound(PostId),

    /// A stats record was already initialized for the post.
    #[error("stats already initialized for post {0}")]
    AlreadyExists(PostId),

    /// The stored record could not be decoded.
    #[error("corrupt stats record for post {id}: {reason}")]
    Corruption { id: PostId, reason: String },

    /// Serialization failure while encoding a record.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for stats operations.
pub type StatsResult<T> = Result<T, StatsError>;
