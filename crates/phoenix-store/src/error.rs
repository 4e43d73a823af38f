use phoenix_types::TypeError;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key does not have a recognized shape.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] TypeError),

    /// The key is well formed but cannot be mapped onto the backend.
    #[error("unsupported key {key}: {reason}")]
    UnsupportedKey { key: String, reason: String },

    /// Serialization or deserialization of store-owned metadata failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
