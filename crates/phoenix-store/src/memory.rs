use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use phoenix_types::KeyKind;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Keys are dispatched on their kind
/// prefix exactly as a production store would see them, so a malformed key
/// fails here the same way it would against real storage.
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, StoredObject>>> {
        self.objects
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.read_map().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted keys of every stored object of the given kind.
    pub fn keys(&self, kind: KeyKind) -> Vec<String> {
        let mut keys: Vec<String> = match self.read_map() {
            Ok(map) => map
                .keys()
                .filter(|k| KeyKind::of(k) == Some(kind))
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }

    /// Remove all objects from the store.
    pub fn clear(&self) -> StoreResult<()> {
        self.write_map()?.clear();
        Ok(())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn put(&self, key: &str, object: &StoredObject) -> StoreResult<()> {
        KeyKind::split(key)?;
        self.write_map()?.insert(key.to_string(), object.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        KeyKind::split(key)?;
        Ok(self.read_map()?.get(key).cloned())
    }

    fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        for key in keys {
            KeyKind::split(key)?;
        }
        let mut map = self.write_map()?;
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        KeyKind::split(key)?;
        Ok(self.read_map()?.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phoenix_types::TypeError;

    fn json(body: &str) -> StoredObject {
        StoredObject::json(body.as_bytes().to_vec(), "Page")
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryBlobStore::new();
        let obj = json(r#"{"name":"San Antonio"}"#);
        store.put("/page/abc", &obj).unwrap();

        let read_back = store.get("/page/abc").unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn put_overwrites() {
        let store = InMemoryBlobStore::new();
        store.put("/page/abc", &json("1")).unwrap();
        store.put("/page/abc", &json("2")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("/page/abc").unwrap().unwrap().data, b"2");
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get("/node/missing").unwrap().is_none());
        assert!(!store.exists("/node/missing").unwrap());
    }

    #[test]
    fn delete_many_skips_missing() {
        let store = InMemoryBlobStore::new();
        store.put("/data/a", &json("a")).unwrap();
        store.put("/data/b", &json("b")).unwrap();
        store.put("/data/c", &json("c")).unwrap();

        store
            .delete_many(&["/data/a".into(), "/data/b".into(), "/data/zz".into()])
            .unwrap();
        assert_eq!(store.keys(KeyKind::Data), vec!["/data/c".to_string()]);
    }

    // -----------------------------------------------------------------------
    // Key dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_unknown_key_shapes() {
        let store = InMemoryBlobStore::new();
        let err = store.put("/bogus/abc", &json("{}")).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidKey(TypeError::UnknownKeyKind(_))
        ));
        assert!(store.get("abc").is_err());
        assert!(store.delete_many(&["/page/ok".into(), "nope".into()]).is_err());
    }

    #[test]
    fn rejected_delete_removes_nothing() {
        let store = InMemoryBlobStore::new();
        store.put("/page/ok", &json("{}")).unwrap();
        assert!(store.delete_many(&["/page/ok".into(), "nope".into()]).is_err());
        assert!(store.exists("/page/ok").unwrap());
    }

    #[test]
    fn keys_filter_by_kind() {
        let store = InMemoryBlobStore::new();
        store.put("/page/b", &json("{}")).unwrap();
        store.put("/page/a", &json("{}")).unwrap();
        store.put("/node/a", &json("{}")).unwrap();
        assert_eq!(
            store.keys(KeyKind::Page),
            vec!["/page/a".to_string(), "/page/b".to_string()]
        );
        assert!(store.keys(KeyKind::Topics).is_empty());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn clear_removes_all() {
        let store = InMemoryBlobStore::default();
        store.put("/page/a", &json("{}")).unwrap();
        store.put("/node/a", &json("{}")).unwrap();
        assert_eq!(store.len(), 2);

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryBlobStore::new());
        store.put("/node/shared", &json("shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let obj = store.get("/node/shared").unwrap().unwrap();
                    assert_eq!(obj.data, b"shared data");
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlobStore::new();
        store.put("/page/x", &json("{}")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("object_count"));
    }
}
