use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("negative post id: {0}")]
    NegativeId(i64),

    #[error("invalid post id: {0:?}")]
    InvalidId(String),

    #[error("invalid day {input:?}: {reason}")]
    InvalidDay { input: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed record: {0}")]
    Decode(String),
}
