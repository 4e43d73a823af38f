use phoenix_index::IndexError;
use phoenix_store::StoreError;
use phoenix_types::KeyKind;
use thiserror::Error;

/// Malformed input, detected before any I/O.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("uninitialized source ID")]
    MissingSourceId,

    #[error("uninitialized source revision")]
    MissingRevision,

    #[error("invalid source time UUID: {0:?}")]
    InvalidTimeUuid(String),

    #[error("uninitialized source authority")]
    MissingAuthority,

    #[error("uninitialized page name")]
    MissingPageName,

    #[error("uninitialized page URL")]
    MissingPageUrl,

    #[error("uninitialized page dateModified")]
    MissingPageDateModified,

    #[error("zero-length page hasPart")]
    EmptyHasPart,

    #[error("update has no nodes")]
    NoNodes,

    #[error("uninitialized dateModified on node {name:?}")]
    MissingNodeDateModified { name: String },

    #[error("node name {0:?} appears more than once in the update")]
    DuplicateNodeName(String),

    #[error("salience {salience} of topic {topic} is outside [0, 1]")]
    Salience { topic: String, salience: f64 },

    #[error("{key} is not a {expected} key")]
    WrongKeyKind { key: String, expected: KeyKind },
}

/// Errors returned by the content repository.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Nothing is stored under this ID.
    #[error("{key}: not found")]
    NotFound { key: String },

    /// The name index has no page under this name.
    #[error("page ({authority}, {name}): not found")]
    PageNameNotFound { authority: String, name: String },

    /// The name index has no node under this name.
    #[error("node ({authority}, {page_name}, {name}): not found")]
    NodeNameNotFound {
        authority: String,
        page_name: String,
        name: String,
    },

    /// The page was committed under a different ID than the one derived
    /// before the write. Indicates a bug in ID derivation.
    #[error("committed page ID does not match precalculated value: {committed} != {computed}")]
    InconsistentPageId { computed: String, committed: String },

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("{context}: {source}")]
    Index {
        context: String,
        #[source]
        source: IndexError,
    },

    #[error("unable to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unable to decode {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no topic index configured")]
    TopicIndexUnavailable,

    #[error("configuration error: {0}")]
    Config(String),
}

impl RepoError {
    pub(crate) fn store(context: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Wrap an index failure, lifting by-name misses into their own variants.
    pub(crate) fn index(context: impl Into<String>, source: IndexError) -> Self {
        match source {
            IndexError::PageNotFound { authority, name } => {
                Self::PageNameNotFound { authority, name }
            }
            IndexError::NodeNotFound {
                authority,
                page_name,
                name,
            } => Self::NodeNameNotFound {
                authority,
                page_name,
                name,
            },
            source => Self::Index {
                context: context.into(),
                source,
            },
        }
    }

    /// Absent by ID.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Never indexed by name.
    pub fn is_name_not_found(&self) -> bool {
        matches!(
            self,
            Self::PageNameNotFound { .. } | Self::NodeNameNotFound { .. }
        )
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_misses_become_name_variants() {
        let err = RepoError::index(
            "lookup",
            IndexError::PageNotFound {
                authority: "fake.wikipedia.org".into(),
                name: "Bogus".into(),
            },
        );
        assert!(err.is_name_not_found());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "page (fake.wikipedia.org, Bogus): not found");
    }

    #[test]
    fn other_index_errors_keep_context() {
        let err = RepoError::index("error updating name index", IndexError::Invalid("x".into()));
        assert!(matches!(err, RepoError::Index { .. }));
        assert_eq!(
            err.to_string(),
            "error updating name index: invalid index input: x"
        );
    }

    #[test]
    fn not_found_is_distinct_from_name_not_found() {
        let err = RepoError::NotFound {
            key: "/page/abc".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_name_not_found());
    }

    #[test]
    fn wrong_key_kind_message() {
        let err = ValidationError::WrongKeyKind {
            key: "/node/abc".into(),
            expected: KeyKind::Page,
        };
        assert_eq!(err.to_string(), "/node/abc is not a page key");
    }
}
