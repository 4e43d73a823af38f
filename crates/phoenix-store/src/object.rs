use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content type of every object the repository writes.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A stored object: payload plus the descriptive metadata written with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub content_type: String,
    /// Free-form string metadata (e.g. `type = Page`).
    pub metadata: BTreeMap<String, String>,
}

impl StoredObject {
    pub fn new(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// A JSON payload tagged with the name of the type it encodes.
    pub fn json(data: Vec<u8>, type_name: &str) -> Self {
        Self::new(data, JSON_CONTENT_TYPE).with_metadata("type", type_name)
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `type` metadata entry, if present.
    pub fn type_name(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub(crate) fn header(&self) -> ObjectHeader {
        ObjectHeader {
            content_type: self.content_type.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub(crate) fn from_parts(data: Vec<u8>, header: ObjectHeader) -> Self {
        Self {
            data,
            content_type: header.content_type,
            metadata: header.metadata,
        }
    }
}

/// Everything about an object except its payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct ObjectHeader {
    pub content_type: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
