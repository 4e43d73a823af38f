//! In-memory indexes for testing and ephemeral use.
//!
//! Both stores keep their data in `HashMap`s behind `RwLock`s and lose it
//! when dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use phoenix_types::{Node, RelatedTopic};

use crate::error::{IndexError, IndexResult};
use crate::names::NameIndex;
use crate::topics::{rank, IndexStats, TopicDocument, TopicIndex};

fn poisoned<E: std::fmt::Display>(e: E) -> IndexError {
    IndexError::Poisoned(e.to_string())
}

type PageKey = (String, String);
type NodeKey = (String, String, String);

/// An in-memory implementation of [`NameIndex`].
#[derive(Debug, Default)]
pub struct InMemoryNameIndex {
    pages: RwLock<HashMap<PageKey, String>>,
    nodes: RwLock<HashMap<NodeKey, String>>,
}

impl InMemoryNameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed page names.
    pub fn page_count(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or(0)
    }

    /// Number of indexed node names.
    pub fn node_count(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }
}

impl NameIndex for InMemoryNameIndex {
    fn apply_page(&self, authority: &str, name: &str, id: &str) -> IndexResult<()> {
        let mut pages = self.pages.write().map_err(poisoned)?;
        pages.insert((authority.to_string(), name.to_string()), id.to_string());
        Ok(())
    }

    fn apply_node(
        &self,
        authority: &str,
        page_name: &str,
        name: &str,
        id: &str,
    ) -> IndexResult<()> {
        let mut nodes = self.nodes.write().map_err(poisoned)?;
        nodes.insert(
            (authority.to_string(), page_name.to_string(), name.to_string()),
            id.to_string(),
        );
        Ok(())
    }

    fn page_id_for_name(&self, authority: &str, name: &str) -> IndexResult<String> {
        let pages = self.pages.read().map_err(poisoned)?;
        pages
            .get(&(authority.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| IndexError::PageNotFound {
                authority: authority.to_string(),
                name: name.to_string(),
            })
    }

    fn node_id_for_name(&self, authority: &str, page_name: &str, name: &str) -> IndexResult<String> {
        let nodes = self.nodes.read().map_err(poisoned)?;
        nodes
            .get(&(authority.to_string(), page_name.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| IndexError::NodeNotFound {
                authority: authority.to_string(),
                page_name: page_name.to_string(),
                name: name.to_string(),
            })
    }
}

/// An in-memory implementation of [`TopicIndex`].
#[derive(Debug, Default)]
pub struct InMemoryTopicIndex {
    by_node: RwLock<HashMap<String, Vec<TopicDocument>>>,
}

impl InMemoryTopicIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently indexed for `node_id`.
    pub fn entries(&self, node_id: &str) -> Vec<TopicDocument> {
        self.by_node
            .read()
            .ok()
            .and_then(|m| m.get(node_id).cloned())
            .unwrap_or_default()
    }
}

impl TopicIndex for InMemoryTopicIndex {
    fn update(&self, node: &Node, topics: &[RelatedTopic]) -> IndexResult<IndexStats> {
        let docs = TopicDocument::for_node(node, topics)?;
        let count = docs.len() as u64;

        let mut by_node = self.by_node.write().map_err(poisoned)?;
        by_node.remove(&node.id);
        if !docs.is_empty() {
            by_node.insert(node.id.clone(), docs);
        }

        Ok(IndexStats {
            added: count,
            indexed: count,
            flushed: count,
            failed: 0,
        })
    }

    fn search(&self, topic_id: &str) -> IndexResult<Vec<String>> {
        let by_node = self.by_node.read().map_err(poisoned)?;
        let hits = by_node
            .values()
            .flatten()
            .filter(|doc| doc.topic_id == topic_id)
            .map(|doc| (doc.node_id.clone(), doc.salience))
            .collect();
        Ok(rank(hits))
    }
}
