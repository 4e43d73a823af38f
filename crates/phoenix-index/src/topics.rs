//! The [`TopicIndex`] trait and the documents it indexes.

use std::collections::HashSet;

use phoenix_types::{Node, RelatedTopic};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Write statistics for one [`TopicIndex::update`].
///
/// A bulk write can partially fail without the call itself failing; callers
/// compare `indexed` and `failed` against `added` to find out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Entries handed to the index.
    pub added: u64,
    /// Entries the index acknowledged as written.
    pub indexed: u64,
    /// Entries sent to the backend.
    pub flushed: u64,
    /// Entries the backend rejected.
    pub failed: u64,
}

impl IndexStats {
    /// Every added entry was indexed.
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.indexed == self.added
    }
}

/// One `(node, topic)` association as stored in a topic index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopicDocument {
    pub node_id: String,
    pub topic_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub salience: f64,
}

impl TopicDocument {
    pub fn new(node_id: &str, topic: &RelatedTopic) -> Self {
        Self {
            node_id: node_id.to_string(),
            topic_id: topic.id.clone(),
            label: topic.label.clone(),
            salience: topic.salience,
        }
    }

    /// Documents for every topic of `node`, refusing nodes without an ID.
    pub fn for_node(node: &Node, topics: &[RelatedTopic]) -> IndexResult<Vec<Self>> {
        if node.id.is_empty() {
            return Err(IndexError::Invalid(format!(
                "node {:?} has no ID; store it before indexing its topics",
                node.name
            )));
        }
        Ok(topics.iter().map(|t| Self::new(&node.id, t)).collect())
    }
}

/// Index of topic annotations on nodes.
///
/// Implementations must be thread-safe (`Send + Sync`). Topic search is
/// advisory: a reader racing an update may briefly see no entries for the
/// node being updated.
pub trait TopicIndex: Send + Sync {
    /// Replace every entry for `node` with `topics`.
    fn update(&self, node: &Node, topics: &[RelatedTopic]) -> IndexResult<IndexStats>;

    /// IDs of nodes annotated with `topic_id`, by descending salience.
    fn search(&self, topic_id: &str) -> IndexResult<Vec<String>>;
}

/// Order `(node_id, salience)` hits by descending salience, ties by node ID,
/// keeping the first occurrence of each node.
pub(crate) fn rank(mut hits: Vec<(String, f64)>) -> Vec<String> {
    hits.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then_with(|| a_id.cmp(b_id)));
    dedup_in_order(hits.into_iter().map(|(id, _)| id))
}

/// Drop repeated IDs, keeping the first occurrence of each.
pub(crate) fn dedup_in_order(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
