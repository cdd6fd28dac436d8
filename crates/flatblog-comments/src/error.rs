use flatblog_types::PostId;

/// Errors from comment operations.
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    /// The post has no persisted comment file.
    #[error("no comments stored for post {0}")]
    NotFound(PostId),

    /// No persisted comment sits at the given position.
    #[error("post {id} has no comment at position {position}")]
    PositionNotFound { id: PostId, position: usize },

    /// The comment file could not be decoded.
    #[error("corrupt comment file for post {id}: {reason}")]
    Corruption { id: PostId, reason: String },

    /// Serialization failure while encoding comments.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for comment operations.
pub type CommentResult<T> = Result<T, CommentError>;
