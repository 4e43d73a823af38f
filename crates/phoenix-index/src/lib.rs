//! Secondary indexes for the Phoenix content repository.
//!
//! Two contracts live here:
//!
//! - [`NameIndex`] maps human-meaningful coordinates to opaque IDs: pages by
//!   `(authority, name)`, nodes by `(authority, page name, node name)`. The
//!   two namespaces are independent, and each has its own "not found" error.
//! - [`TopicIndex`] associates nodes with ranked topic annotations and
//!   answers "which nodes are about this topic?".
//!
//! # Backends
//!
//! - [`InMemoryNameIndex`], [`InMemoryTopicIndex`] -- for tests and embedding
//! - [`ElasticsearchNameIndex`], [`ElasticsearchTopicIndex`] -- HTTP adapters
//!   configured by [`ElasticsearchConfig`]

pub mod elastic;
pub mod error;
pub mod memory;
pub mod names;
pub mod topics;

pub use elastic::{ElasticsearchConfig, ElasticsearchNameIndex, ElasticsearchTopicIndex};
pub use error::{IndexError, IndexResult};
pub use memory::{InMemoryNameIndex, InMemoryTopicIndex};
pub use names::NameIndex;
pub use topics::{IndexStats, TopicDocument, TopicIndex};
