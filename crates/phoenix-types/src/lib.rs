//! Foundation types for the Phoenix content repository.
//!
//! A wiki page revision is decomposed into a [`Page`] (the document root) and
//! an ordered list of [`Node`]s (its sections). Pages may additionally carry
//! linked-data fact sheets ([`Thing`]) keyed by vocabulary, and nodes may be
//! annotated with [`RelatedTopic`]s.
//!
//! # Key Types
//!
//! - [`Source`] -- Coordinates of the revision a document was cut from
//! - [`Page`] -- Root of one document, with `has_part` section order
//! - [`Node`] -- One independently addressable section of a page
//! - [`Thing`] -- schema.org-style linked data attached to a page
//! - [`RelatedTopic`] -- Salience-scored topic annotation on a node
//! - [`KeyKind`] -- Type tag carried by every storage key prefix

pub mod content;
pub mod error;
pub mod identity;

pub use content::{Node, Page, RelatedTopic, Source, Thing};
pub use error::TypeError;
pub use identity::{node_id, page_id, random_id, thing_id, topics_key, KeyKind};
