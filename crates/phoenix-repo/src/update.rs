//! The unit of work accepted by [`Repository::apply`](crate::Repository::apply).

use std::collections::BTreeMap;
use std::fmt;

use phoenix_types::{Node, Page, Thing};

/// Side effect run after each node is stored during an update.
///
/// Used to publish "node stored" notifications. Invoked synchronously, once
/// per node, in section order. A returned error is logged and otherwise
/// ignored: it neither fails the update nor is retried.
pub trait NodeHook: Send + Sync {
    fn node_stored(&self, node: &Node) -> anyhow::Result<()>;
}

impl<F> NodeHook for F
where
    F: Fn(&Node) -> anyhow::Result<()> + Send + Sync,
{
    fn node_stored(&self, node: &Node) -> anyhow::Result<()> {
        self(node)
    }
}

/// A page revision to commit: the page, its sections in order, and its
/// linked data keyed by vocabulary.
///
/// `page.has_part` and `page.about` are rebuilt by `apply`; whatever they
/// hold on the way in is discarded. After a successful `apply`, `page` and
/// `nodes` carry their assigned IDs.
#[derive(Default)]
pub struct Update {
    pub page: Page,
    pub nodes: Vec<Node>,
    pub abouts: BTreeMap<String, Thing>,
    pub on_node_stored: Option<Box<dyn NodeHook>>,
}

impl Update {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_about(mut self, vocabulary: impl Into<String>, thing: Thing) -> Self {
        self.abouts.insert(vocabulary.into(), thing);
        self
    }

    pub fn with_hook(mut self, hook: impl NodeHook + 'static) -> Self {
        self.on_node_stored = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("page", &self.page)
            .field("nodes", &self.nodes.len())
            .field("abouts", &self.abouts.keys().collect::<Vec<_>>())
            .field("on_node_stored", &self.on_node_stored.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn builder_collects_parts() {
        let update = Update::new(Page::default())
            .with_node(Node::default())
            .with_node(Node::default())
            .with_about("//schema.org", Thing::new());
        assert_eq!(update.nodes.len(), 2);
        assert!(update.abouts.contains_key("//schema.org"));
        assert!(update.on_node_stored.is_none());
    }

    #[test]
    fn closures_are_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let update = Update::new(Page::default()).with_hook(move |_: &Node| -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let hook = update.on_node_stored.as_ref().unwrap();
        hook.node_stored(&Node::default()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(format!("{update:?}").contains("on_node_stored: true"));
    }
}
