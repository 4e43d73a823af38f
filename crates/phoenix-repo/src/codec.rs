//! JSON encoding of persisted objects.
//!
//! Objects are stored as UTF-8 JSON. Node payloads carry raw HTML, which is
//! written verbatim: `serde_json` escapes only quotes, backslashes and
//! control characters, never `<`, `>` or `&`.

use phoenix_store::StoredObject;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{RepoError, RepoResult};

/// Encode `value` as a JSON object tagged with `type_name`.
pub fn encode<T: Serialize>(value: &T, type_name: &'static str) -> RepoResult<StoredObject> {
    let data = serde_json::to_vec(value).map_err(|source| RepoError::Encode {
        what: type_name,
        source,
    })?;
    Ok(StoredObject::json(data, type_name))
}

/// Decode the object stored under `key`.
pub fn decode<T: DeserializeOwned>(key: &str, object: &StoredObject) -> RepoResult<T> {
    serde_json::from_slice(&object.data).map_err(|source| RepoError::Decode {
        key: key.to_string(),
        source,
    })
}
