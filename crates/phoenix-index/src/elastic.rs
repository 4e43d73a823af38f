//! Elasticsearch-backed indexes.
//!
//! Name lookups are point reads of documents whose `_id` is the
//! colon-joined name coordinates (`authority:name` for pages,
//! `authority:page:name` for nodes). Topic entries are one document per
//! `(node, topic)` pair; an update deletes the node's entries by query and
//! bulk-inserts the replacement set.
//!
//! All writes ask for `refresh=true` so a lookup following a write from the
//! same caller observes it.

use std::fmt;
use std::time::Duration;

use phoenix_types::{Node, RelatedTopic};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};
use crate::names::NameIndex;
use crate::topics::{dedup_in_order, IndexStats, TopicDocument, TopicIndex};

/// `[elasticsearch]` section of the configuration file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL, e.g. `https://search.example.org:9200`.
    pub endpoint: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_page_index")]
    pub page_index: String,

    #[serde(default = "default_node_index")]
    pub node_index: String,

    #[serde(default = "default_topic_index")]
    pub topic_index: String,

    /// Upper bound on hits returned by a topic search.
    #[serde(default = "default_search_size")]
    pub search_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_index() -> String {
    "page_name".into()
}
fn default_node_index() -> String {
    "node_name".into()
}
fn default_topic_index() -> String {
    "topics".into()
}
fn default_search_size() -> usize {
    100
}
fn default_timeout_secs() -> u64 {
    30
}

impl ElasticsearchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: None,
            password: None,
            page_index: default_page_index(),
            node_index: default_node_index(),
            topic_index: default_topic_index(),
            search_size: default_search_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("page_index", &self.page_index)
            .field("node_index", &self.node_index)
            .field("topic_index", &self.topic_index)
            .field("search_size", &self.search_size)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Shared HTTP plumbing
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct EsClient {
    http: Client,
    endpoint: Url,
    username: Option<String>,
    password: Option<String>,
}

impl EsClient {
    fn new(config: &ElasticsearchConfig) -> IndexResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| IndexError::InvalidEndpoint(format!("{}: {e}", config.endpoint)))?;
        if endpoint.cannot_be_a_base() {
            return Err(IndexError::InvalidEndpoint(config.endpoint.clone()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Endpoint URL with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> IndexResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| IndexError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }
}

impl fmt::Debug for EsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

fn backend_error(response: Response, context: String) -> IndexError {
    IndexError::Backend {
        status: response.status().as_u16(),
        context,
    }
}

fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> IndexResult<T> {
    let bytes = response.bytes()?;
    serde_json::from_slice(&bytes).map_err(|e| IndexError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Name index
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct NameDocument {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: Option<bool>,
    #[serde(rename = "_source")]
    source: Option<NameDocument>,
}

/// Escape `%` and `:` so a colon in a coordinate cannot be mistaken for the
/// separator.
fn escape_coordinate(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

pub(crate) fn page_doc_id(authority: &str, name: &str) -> String {
    format!("{}:{}", escape_coordinate(authority), escape_coordinate(name))
}

pub(crate) fn node_doc_id(authority: &str, page_name: &str, name: &str) -> String {
    format!(
        "{}:{}:{}",
        escape_coordinate(authority),
        escape_coordinate(page_name),
        escape_coordinate(name)
    )
}

/// A [`NameIndex`] backed by two Elasticsearch indices.
#[derive(Debug, Clone)]
pub struct ElasticsearchNameIndex {
    client: EsClient,
    page_index: String,
    node_index: String,
}

impl ElasticsearchNameIndex {
    pub fn new(config: &ElasticsearchConfig) -> IndexResult<Self> {
        Ok(Self {
            client: EsClient::new(config)?,
            page_index: config.page_index.clone(),
            node_index: config.node_index.clone(),
        })
    }

    fn put(&self, index: &str, doc_id: &str, id: &str) -> IndexResult<()> {
        let url = self.client.url(&[index, "_doc", doc_id])?;
        let response = self
            .client
            .request(Method::PUT, url)
            .query(&[("refresh", "true")])
            .json(&NameDocument { id: id.to_string() })
            .send()?;
        if !response.status().is_success() {
            return Err(backend_error(response, format!("error indexing {doc_id}")));
        }
        debug!(index, doc_id, id, "indexed name");
        Ok(())
    }

    /// `Ok(None)` when the document does not exist.
    fn get(&self, index: &str, doc_id: &str) -> IndexResult<Option<String>> {
        let url = self.client.url(&[index, "_doc", doc_id])?;
        let response = self.client.request(Method::GET, url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(backend_error(
                response,
                format!("unknown error retrieving {doc_id}"),
            ));
        }
        let body: GetResponse = decode(response)?;
        if body.found == Some(false) {
            return Ok(None);
        }
        Ok(body.source.map(|doc| doc.id))
    }
}

impl NameIndex for ElasticsearchNameIndex {
    fn apply_page(&self, authority: &str, name: &str, id: &str) -> IndexResult<()> {
        self.put(&self.page_index, &page_doc_id(authority, name), id)
    }

    fn apply_node(
        &self,
        authority: &str,
        page_name: &str,
        name: &str,
        id: &str,
    ) -> IndexResult<()> {
        self.put(&self.node_index, &node_doc_id(authority, page_name, name), id)
    }

    fn page_id_for_name(&self, authority: &str, name: &str) -> IndexResult<String> {
        self.get(&self.page_index, &page_doc_id(authority, name))?
            .ok_or_else(|| IndexError::PageNotFound {
                authority: authority.to_string(),
                name: name.to_string(),
            })
    }

    fn node_id_for_name(&self, authority: &str, page_name: &str, name: &str) -> IndexResult<String> {
        self.get(&self.node_index, &node_doc_id(authority, page_name, name))?
            .ok_or_else(|| IndexError::NodeNotFound {
                authority: authority.to_string(),
                page_name: page_name.to_string(),
                name: name.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Topic index
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<std::collections::HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: SearchSource,
}

#[derive(Debug, Deserialize)]
struct SearchSource {
    node_id: String,
}

/// Newline-delimited `_bulk` body indexing `docs` into `index`.
pub(crate) fn bulk_body(index: &str, docs: &[TopicDocument]) -> IndexResult<String> {
    let action = json!({ "index": { "_index": index } }).to_string();
    let mut body = String::new();
    for doc in docs {
        let source = serde_json::to_string(doc).map_err(|e| IndexError::Decode(e.to_string()))?;
        body.push_str(&action);
        body.push('\n');
        body.push_str(&source);
        body.push('\n');
    }
    Ok(body)
}

pub(crate) fn search_body(topic_id: &str, size: usize) -> Value {
    json!({
        "size": size,
        "query": { "term": { "topic_id": topic_id } },
        "sort": [
            { "salience": { "order": "desc" } },
            { "node_id": { "order": "asc" } }
        ],
        "_source": ["node_id"]
    })
}

fn bulk_stats(added: u64, response: &BulkResponse) -> IndexStats {
    let flushed = response.items.len() as u64;
    let indexed = response
        .items
        .iter()
        .flat_map(|item| item.values())
        .filter(|r| (200..300).contains(&r.status) && r.error.is_none())
        .count() as u64;
    IndexStats {
        added,
        indexed,
        flushed,
        failed: flushed.saturating_sub(indexed),
    }
}

/// A [`TopicIndex`] backed by a single Elasticsearch index.
#[derive(Debug, Clone)]
pub struct ElasticsearchTopicIndex {
    client: EsClient,
    index: String,
    search_size: usize,
}

impl ElasticsearchTopicIndex {
    pub fn new(config: &ElasticsearchConfig) -> IndexResult<Self> {
        Ok(Self {
            client: EsClient::new(config)?,
            index: config.topic_index.clone(),
            search_size: config.search_size,
        })
    }

    /// Create the index with keyword mappings for exact-match lookups.
    ///
    /// `update` calls this the first time it finds the index missing.
    ///
    /// An index that already exists is left untouched.
    pub fn ensure_index(&self) -> IndexResult<()> {
        let url = self.client.url(&[&self.index])?;
        let mappings = json!({
            "mappings": {
                "properties": {
                    "node_id": { "type": "keyword" },
                    "topic_id": { "type": "keyword" },
                    "label": { "type": "text" },
                    "salience": { "type": "float" }
                }
            }
        });
        let response = self.client.request(Method::PUT, url).json(&mappings).send()?;
        let status = response.status();
        if status.is_success() {
            debug!(index = %self.index, "created topic index");
            return Ok(());
        }
        let body: Value = decode(response)?;
        if body["error"]["type"] == "resource_already_exists_exception" {
            return Ok(());
        }
        Err(IndexError::Backend {
            status: status.as_u16(),
            context: format!("unable to create index {}", self.index),
        })
    }

    /// Delete every entry for `node_id`. Returns `false` when the index does
    /// not exist yet.
    fn delete_node(&self, node_id: &str) -> IndexResult<bool> {
        let url = self.client.url(&[&self.index, "_delete_by_query"])?;
        let response = self
            .client
            .request(Method::POST, url)
            .query(&[("refresh", "true")])
            .json(&json!({ "query": { "term": { "node_id": node_id } } }))
            .send()?;
        // A missing index holds nothing to delete.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(backend_error(
                response,
                format!("error deleting topics for {node_id}"),
            ));
        }
        Ok(true)
    }
}

impl TopicIndex for ElasticsearchTopicIndex {
    fn update(&self, node: &Node, topics: &[RelatedTopic]) -> IndexResult<IndexStats> {
        let docs = TopicDocument::for_node(node, topics)?;
        let exists = self.delete_node(&node.id)?;
        if docs.is_empty() {
            return Ok(IndexStats::default());
        }
        // `_bulk` would otherwise create the index with dynamic mappings, and
        // term queries and sorts on text-mapped IDs do not work.
        if !exists {
            self.ensure_index()?;
        }

        let url = self.client.url(&["_bulk"])?;
        let response = self
            .client
            .request(Method::POST, url)
            .query(&[("refresh", "true")])
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(bulk_body(&self.index, &docs)?)
            .send()?;
        if !response.status().is_success() {
            return Err(backend_error(
                response,
                format!("bulk indexing failed for {}", node.id),
            ));
        }

        let body: BulkResponse = decode(response)?;
        let stats = bulk_stats(docs.len() as u64, &body);
        if body.errors || !stats.is_complete() {
            warn!(node_id = %node.id, failed = stats.failed, "partial topic indexing failure");
        }
        Ok(stats)
    }

    fn search(&self, topic_id: &str) -> IndexResult<Vec<String>> {
        let url = self.client.url(&[&self.index, "_search"])?;
        let response = self
            .client
            .request(Method::POST, url)
            .json(&search_body(topic_id, self.search_size))
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(backend_error(
                response,
                format!("topic search failed for {topic_id}"),
            ));
        }
        let body: SearchResponse = decode(response)?;
        Ok(dedup_in_order(
            body.hits.hits.into_iter().map(|hit| hit.source.node_id),
        ))
    }
}
