use std::sync::Arc;

use phoenix_index::{ElasticsearchNameIndex, ElasticsearchTopicIndex, IndexStats, NameIndex, TopicIndex};
use phoenix_store::{BlobStore, FsBlobStore, StoreError};
use phoenix_types::{identity, KeyKind, Node, Page, RelatedTopic, Thing};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::PhoenixConfig;
use crate::error::{RepoError, RepoResult};
use crate::update::Update;
use crate::validation::{validate_key, validate_node, validate_page, validate_topics, validate_update};

/// Read/write access to the content repository.
///
/// Depends only on the [`BlobStore`], [`NameIndex`] and (optionally)
/// [`TopicIndex`] contracts.
pub struct Repository {
    store: Arc<dyn BlobStore>,
    names: Arc<dyn NameIndex>,
    topics: Option<Arc<dyn TopicIndex>>,
}

impl Repository {
    pub fn new(store: Arc<dyn BlobStore>, names: Arc<dyn NameIndex>) -> Self {
        Self {
            store,
            names,
            topics: None,
        }
    }

    pub fn with_topic_index(mut self, topics: Arc<dyn TopicIndex>) -> Self {
        self.topics = Some(topics);
        self
    }

    /// Filesystem blob storage plus Elasticsearch name and topic indexes.
    pub fn open(config: &PhoenixConfig) -> RepoResult<Self> {
        let es = config
            .elasticsearch
            .as_ref()
            .ok_or_else(|| RepoError::Config("missing [elasticsearch] section".into()))?;
        let store = FsBlobStore::open(&config.store)
            .map_err(|e| RepoError::store("unable to open blob store", e))?;
        let names = ElasticsearchNameIndex::new(es)
            .map_err(|e| RepoError::index("unable to create name index", e))?;
        let topics = ElasticsearchTopicIndex::new(es)
            .map_err(|e| RepoError::index("unable to create topic index", e))?;
        info!(root = %config.store.root.display(), endpoint = %es.endpoint, "opened repository");
        Ok(Self::new(Arc::new(store), Arc::new(names)).with_topic_index(Arc::new(topics)))
    }

    // ---- Storage helpers ----

    /// Read and decode the `kind` object stored under `key`.
    ///
    /// A key that is malformed, of another kind, or that the backend cannot
    /// address names nothing stored, so it reads as `NotFound` like any
    /// other absent key.
    fn fetch<T: DeserializeOwned>(&self, key: &str, kind: KeyKind) -> RepoResult<T> {
        let not_found = || RepoError::NotFound {
            key: key.to_string(),
        };
        if KeyKind::of(key) != Some(kind) {
            return Err(not_found());
        }
        let object = match self.store.get(key) {
            Ok(Some(object)) => object,
            Ok(None) | Err(StoreError::InvalidKey(_) | StoreError::UnsupportedKey { .. }) => {
                return Err(not_found())
            }
            Err(e) => return Err(RepoError::store(format!("error retrieving {key}"), e)),
        };
        codec::decode(key, &object)
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T, type_name: &'static str) -> RepoResult<()> {
        let object = codec::encode(value, type_name)?;
        self.store
            .put(key, &object)
            .map_err(|e| RepoError::store(format!("error storing {key}"), e))
    }

    fn delete(&self, keys: &[String], kind: KeyKind) -> RepoResult<()> {
        for key in keys {
            validate_key(key, kind)?;
        }
        self.store
            .delete_many(keys)
            .map_err(|e| RepoError::store(format!("error deleting {kind} objects"), e))
    }

    // ---- Reads ----

    pub fn get_page(&self, id: &str) -> RepoResult<Page> {
        self.fetch(id, KeyKind::Page)
    }

    pub fn get_page_by_name(&self, authority: &str, name: &str) -> RepoResult<Page> {
        let id = self
            .names
            .page_id_for_name(authority, name)
            .map_err(|e| RepoError::index("page name lookup failed", e))?;
        self.get_page(&id)
    }

    pub fn get_node(&self, id: &str) -> RepoResult<Node> {
        self.fetch(id, KeyKind::Node)
    }

    pub fn get_node_by_name(&self, authority: &str, page_name: &str, name: &str) -> RepoResult<Node> {
        let id = self
            .names
            .node_id_for_name(authority, page_name, name)
            .map_err(|e| RepoError::index("node name lookup failed", e))?;
        self.get_node(&id)
    }

    pub fn get_about(&self, id: &str) -> RepoResult<Thing> {
        let mut thing: Thing = self.fetch(id, KeyKind::Data)?;
        // Things don't serialize their ID.
        thing.id = id.to_string();
        Ok(thing)
    }

    /// Topics stored for `node`.
    ///
    /// A node whose topics were never stored is `NotFound`; a stored empty
    /// list is `Ok(vec![])`.
    pub fn get_topics(&self, node: &Node) -> RepoResult<Vec<RelatedTopic>> {
        self.fetch(&identity::topics_key(node), KeyKind::Topics)
    }

    // ---- Writes ----

    /// Store a page under its canonical ID and return the ID.
    ///
    /// Any ID already assigned to `page` is overwritten.
    pub fn put_page(&self, page: &mut Page) -> RepoResult<String> {
        validate_page(page)?;
        page.id = page.canonical_id();
        self.persist(&page.id, page, "Page")?;
        Ok(page.id.clone())
    }

    /// Store a node under its derived ID and return the ID.
    ///
    /// Any ID already assigned to `node` is overwritten.
    pub fn put_node(&self, node: &mut Node) -> RepoResult<String> {
        validate_node(node)?;
        node.id = node.canonical_id();
        self.persist(&node.id, node, "Node")?;
        Ok(node.id.clone())
    }

    /// Store a linked-data object under a fresh random ID and return the ID.
    pub fn put_about(&self, thing: &mut Thing) -> RepoResult<String> {
        thing.id = identity::thing_id();
        self.persist(&thing.id, thing, "Thing")?;
        Ok(thing.id.clone())
    }

    /// Store `topics` for `node`, replacing any earlier list.
    pub fn put_topics(&self, node: &Node, topics: &[RelatedTopic]) -> RepoResult<()> {
        validate_topics(topics)?;
        self.persist(&identity::topics_key(node), &topics, "[]RelatedTopic")
    }

    pub fn delete_page(&self, id: &str) -> RepoResult<()> {
        self.delete(&[id.to_string()], KeyKind::Page)
    }

    pub fn delete_node(&self, id: &str) -> RepoResult<()> {
        self.delete(&[id.to_string()], KeyKind::Node)
    }

    pub fn delete_about(&self, id: &str) -> RepoResult<()> {
        self.delete_abouts(&[id.to_string()])
    }

    pub fn delete_abouts(&self, ids: &[String]) -> RepoResult<()> {
        self.delete(ids, KeyKind::Data)
    }

    // ---- Topics ----

    /// Store `topics` for `node`, then replace its entries in the topic
    /// index.
    ///
    /// The index is only touched once storage succeeded. Returns `None` when
    /// no topic index is configured.
    pub fn apply_topics(&self, node: &Node, topics: &[RelatedTopic]) -> RepoResult<Option<IndexStats>> {
        self.put_topics(node, topics)?;
        let Some(index) = &self.topics else {
            return Ok(None);
        };
        let stats = index
            .update(node, topics)
            .map_err(|e| RepoError::index(format!("error indexing topics for {}", node.id), e))?;
        if !stats.is_complete() {
            warn!(node_id = %node.id, added = stats.added, failed = stats.failed, "topic indexing incomplete");
        }
        Ok(Some(stats))
    }

    /// IDs of nodes annotated with `topic_id`, most salient first.
    pub fn search_topic(&self, topic_id: &str) -> RepoResult<Vec<String>> {
        let index = self.topics.as_ref().ok_or(RepoError::TopicIndexUnavailable)?;
        index
            .search(topic_id)
            .map_err(|e| RepoError::index(format!("topic search for {topic_id} failed"), e))
    }

    /// Nodes annotated with `topic_id`, most salient first.
    ///
    /// The topic index is advisory; IDs it returns that no longer resolve
    /// are skipped.
    pub fn nodes_for_topic(&self, topic_id: &str) -> RepoResult<Vec<Node>> {
        let mut nodes = Vec::new();
        for id in self.search_topic(topic_id)? {
            match self.get_node(&id) {
                Ok(node) => nodes.push(node),
                Err(RepoError::NotFound { key }) => {
                    debug!(%key, topic_id, "topic index refers to a missing node");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(nodes)
    }

    // ---- Update protocol ----

    /// Commit a page revision. Returns the page ID.
    ///
    /// Write order: nodes (in section order), linked data, the page itself,
    /// then the name index. Linked data referenced by the previously stored
    /// revision is deleted once the new page is committed. Nodes of the
    /// previous revision are left in place.
    ///
    /// Not atomic: a failure after the first write leaves the objects
    /// written so far in storage, unreferenced.
    pub fn apply(&self, update: &mut Update) -> RepoResult<String> {
        validate_update(update)?;

        let page_id = update.page.canonical_id();
        let previous = match self.get_page(&page_id) {
            Ok(page) => Some(page),
            Err(RepoError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        // Order of has_part is the section order; keep this sequential.
        update.page.has_part.clear();
        for node in update.nodes.iter_mut() {
            node.is_part_of = vec![page_id.clone()];
            node.source = update.page.source.clone();

            let id = self.put_node(node)?;
            update.page.has_part.push(id);

            if let Some(hook) = &update.on_node_stored {
                if let Err(e) = hook.node_stored(node) {
                    warn!(node_id = %node.id, error = %e, "node hook failed");
                }
            }
        }

        update.page.about.clear();
        for (vocabulary, thing) in update.abouts.iter_mut() {
            let id = self.put_about(thing)?;
            update.page.about.insert(vocabulary.clone(), id);
        }

        let committed = self.put_page(&mut update.page)?;
        if committed != page_id {
            return Err(RepoError::InconsistentPageId {
                computed: page_id,
                committed,
            });
        }

        if let Some(previous) = previous {
            let superseded: Vec<String> = previous
                .about
                .into_values()
                .filter(|id| !update.page.about.values().any(|current| current == id))
                .collect();
            if !superseded.is_empty() {
                if let Err(e) = self.delete_abouts(&superseded) {
                    warn!(page_id = %page_id, error = %e, "unable to delete superseded linked data");
                }
            }
        }

        self.names
            .apply(&update.page, &update.nodes)
            .map_err(|e| RepoError::index("error updating name index", e))?;

        info!(
            page_id = %page_id,
            revision = update.page.source.revision,
            nodes = update.nodes.len(),
            abouts = update.page.about.len(),
            "applied update"
        );
        Ok(page_id)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("topic_index", &self.topics.is_some())
            .finish()
    }
}
