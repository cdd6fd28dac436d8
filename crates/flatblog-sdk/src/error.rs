use thiserror::Error;

use flatblog_comments::CommentError;
use flatblog_index::IndexError;
use flatblog_stats::StatsError;
use flatblog_store::PostError;
use flatblog_types::TypeError;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("post error: {0}")]
    Post(#[from] PostError),

    #[error("stats error: {0}")]
    Stats(#[from] StatsError),

    #[error("comment error: {0}")]
    Comment(#[from] CommentError),

    #[error("time index error: {0}")]
    Index(#[from] IndexError),

    /// Malformed caller input, such as a bad day string.
    #[error("invalid input: {0}")]
    Input(#[from] TypeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SdkError {
    /// Whether the caller is at fault (unknown post, bad input) as opposed
    /// to the storage layer.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Post(e) => e.is_not_found() || matches!(e, PostError::Hidden(_)),
            Self::Stats(e) => matches!(e, StatsError::NotFound(_)),
            Self::Comment(e) => matches!(e, CommentError::NotFound(_) | CommentError::PositionNotFound { .. }),
            Self::Input(_) => true,
            Self::Index(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }

    /// Message safe to show an external caller. Server-side causes are
    /// replaced by a generic message.
    pub fn public_message(&self) -> String {
        if !self.is_client_error() {
            return "internal server error".to_string();
        }
        match self {
            Self::Post(PostError::Hidden(_) | PostError::NegativeId(_) | PostError::NotFound(_))
            | Self::Stats(_) => "post not found".to_string(),
            Self::Comment(CommentError::NotFound(_)) => "no comments for this post".to_string(),
            other => other.to_string(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
