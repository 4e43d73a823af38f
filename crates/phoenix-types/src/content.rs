//! The document graph: pages, nodes, linked data, and topic annotations.
//!
//! Field names on the wire follow schema.org where a counterpart exists
//! (`dateModified`, `hasPart`, `isPartOf`, `sameAs`).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity;

/// Where a document came from.
///
/// Source coordinates are the sole input to page and node ID derivation, so
/// they must be fully populated before anything is written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Page ID in the source wiki.
    pub id: i64,
    /// Revision ID in the source wiki.
    pub revision: i64,
    /// Version-1 UUID; date and time the source document was rendered.
    #[serde(rename = "tid")]
    pub time_uuid: String,
    /// Hostname of the originating wiki.
    pub authority: String,
}

/// The root node of a document graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical ID, derived from `source`. Assigned on write.
    #[serde(rename = "identifier", default)]
    pub id: String,

    #[serde(rename = "_source")]
    pub source: Source,

    pub name: String,

    pub url: String,

    #[serde(rename = "dateModified")]
    pub date_modified: Option<DateTime<Utc>>,

    /// Node IDs in section order.
    ///
    /// Unlike its schema.org namesake this is the adjacency list of the
    /// document graph, and its order is significant.
    #[serde(rename = "hasPart", default)]
    pub has_part: Vec<String>,

    /// Linked-data object IDs keyed by vocabulary.
    #[serde(default)]
    pub about: BTreeMap<String, String>,
}

impl Page {
    /// The canonical ID this page will be stored under.
    pub fn canonical_id(&self) -> String {
        identity::page_id(&self.source)
    }
}

/// One section of a page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: String,

    /// Text of the section's first heading.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "_source")]
    pub source: Source,

    /// IDs of the pages this node belongs to.
    #[serde(rename = "isPartOf", default)]
    pub is_part_of: Vec<String>,

    #[serde(rename = "dateModified")]
    pub date_modified: Option<DateTime<Utc>>,

    /// Raw, unsanitized HTML of the section.
    #[serde(rename = "unsafe", default)]
    pub unsafe_html: String,
}

impl Node {
    /// The ID this node will be stored under.
    pub fn canonical_id(&self) -> String {
        identity::node_id(&self.source, &self.name)
    }

    /// The key its related topics are stored under.
    pub fn topics_key(&self) -> String {
        identity::topics_key(self)
    }
}

/// JSON-LD context used for every [`Thing`].
pub const SCHEMA_ORG_CONTEXT: &str = "https://schema.org";

/// A schema.org `Thing`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    /// Storage key; never serialized, restored on read.
    #[serde(skip)]
    pub id: String,

    #[serde(rename = "@context")]
    pub context: String,

    #[serde(rename = "@type")]
    pub kind: String,

    #[serde(rename = "alternateName", default, skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "sameAs", default)]
    pub same_as: String,
}

impl Thing {
    pub fn new() -> Self {
        Self {
            id: String::new(),
            context: SCHEMA_ORG_CONTEXT.to_string(),
            kind: "Thing".to_string(),
            alternate_name: None,
            description: None,
            image: None,
            name: None,
            same_as: String::new(),
        }
    }
}

impl Default for Thing {
    fn default() -> Self {
        Self::new()
    }
}

/// A topic annotation on a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelatedTopic {
    /// External topic identifier (e.g. a Wikidata QID).
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Relevance in `[0, 1]`.
    pub salience: f64,
}

impl RelatedTopic {
    pub fn new(id: impl Into<String>, salience: f64) -> Self {
        Self {
            id: id.into(),
            label: None,
            salience,
        }
    }

    /// Whether the salience is a finite number within `[0, 1]`.
    pub fn has_valid_salience(&self) -> bool {
        (0.0..=1.0).contains(&self.salience)
    }
}
