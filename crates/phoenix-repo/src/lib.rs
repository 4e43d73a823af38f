//! The Phoenix content repository.
//!
//! Wiki page revisions enter as an [`Update`]: a page, its sections in
//! order, and linked-data objects keyed by vocabulary. [`Repository::apply`]
//! writes them in a fixed order (nodes, then linked data, then the page,
//! then the name index) so that a reader never observes a page referencing
//! nodes that do not exist yet.
//!
//! Reads go straight to blob storage by ID, or through the name index by
//! `(authority, name)`. "Absent by ID" and "never indexed by name" are
//! distinct error variants.
//!
//! `apply` is not atomic. A failure partway leaves already-written objects
//! in storage, unreferenced; nothing is rolled back. Callers serialize
//! writes per page themselves.

pub mod codec;
pub mod config;
pub mod error;
pub mod repository;
pub mod telemetry;
pub mod update;
pub mod validation;

pub use config::{LoggingConfig, PhoenixConfig};
pub use error::{RepoError, RepoResult, ValidationError};
pub use repository::Repository;
pub use update::{NodeHook, Update};

// Re-export key types
pub use phoenix_index::{
    ElasticsearchConfig, InMemoryNameIndex, InMemoryTopicIndex, IndexStats, NameIndex, TopicIndex,
};
pub use phoenix_store::{BlobStore, FsBlobStore, InMemoryBlobStore, StoreConfig};
pub use phoenix_types::{KeyKind, Node, Page, RelatedTopic, Source, Thing};
