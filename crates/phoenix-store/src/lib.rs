//! Blob storage for the Phoenix content repository.
//!
//! The repository persists every page, node, linked-data object and topic
//! array as an opaque byte payload under a path-shaped key such as
//! `/page/5f0c...`. This crate defines that contract and its backends.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlobStore`] trait:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. `put` overwrites; the last writer of a key wins.
//! 2. A missing key is `Ok(None)`, never an error.
//! 3. Keys must carry a known kind prefix; anything else is rejected.
//! 4. The store never interprets payloads.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FsBlobStore, StoreConfig};
pub use memory::InMemoryBlobStore;
pub use object::{StoredObject, JSON_CONTENT_TYPE};
pub use traits::BlobStore;
