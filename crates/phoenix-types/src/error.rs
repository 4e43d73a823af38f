use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unrecognized key format: {0}")]
    UnknownKeyKind(String),

    #[error("key has no identifier after its prefix: {0}")]
    EmptyIdentifier(String),
}
