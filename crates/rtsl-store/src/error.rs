/// Errors from shard store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested shard was not found.
    #[error("shard not found: {0}")]
    NotFound(String),

    /// The shard name cannot be mapped onto the store.
    #[error("invalid shard name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
