use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("identity component out of range: {0}")]
    OutOfRange(String),

    #[error("empty surrogate type tag")]
    EmptyTag,
}
