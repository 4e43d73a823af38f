//! The [`NameIndex`] trait.

use phoenix_types::{Node, Page};

use crate::error::IndexResult;

/// Secondary index from human names to opaque IDs.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes are
/// idempotent overwrites, and a lookup immediately following a write from
/// the same caller must observe it.
pub trait NameIndex: Send + Sync {
    /// Record that page `name` on `authority` is stored under `id`.
    fn apply_page(&self, authority: &str, name: &str, id: &str) -> IndexResult<()>;

    /// Record that node `name` of page `page_name` is stored under `id`.
    fn apply_node(&self, authority: &str, page_name: &str, name: &str, id: &str)
        -> IndexResult<()>;

    /// Look up a page ID.
    ///
    /// Fails with [`IndexError::PageNotFound`](crate::IndexError::PageNotFound)
    /// when nothing is indexed under the name.
    fn page_id_for_name(&self, authority: &str, name: &str) -> IndexResult<String>;

    /// Look up a node ID.
    ///
    /// Fails with [`IndexError::NodeNotFound`](crate::IndexError::NodeNotFound)
    /// when nothing is indexed under the name.
    fn node_id_for_name(&self, authority: &str, page_name: &str, name: &str)
        -> IndexResult<String>;

    /// Index a committed page and its nodes.
    ///
    /// Node names are scoped by the page name. Unnamed nodes have no name to
    /// look up and are skipped.
    fn apply(&self, page: &Page, nodes: &[Node]) -> IndexResult<()> {
        let authority = &page.source.authority;
        self.apply_page(authority, &page.name, &page.id)?;
        for node in nodes.iter().filter(|n| !n.name.is_empty()) {
            self.apply_node(authority, &page.name, &node.name, &node.id)?;
        }
        Ok(())
    }
}
