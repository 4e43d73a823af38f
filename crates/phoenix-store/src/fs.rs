//! Filesystem-backed blob store.
//!
//! Each key maps to a file under the store root: `/page/5f0c...` becomes
//! `<root>/page/5f0c...`, with its content type and metadata in a sibling
//! `<id>.meta` file. Files are written to a temporary file in the same
//! directory and renamed into place, so a reader sees either the old object
//! or the new one, never a torn write.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use phoenix_types::KeyKind;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectHeader, StoredObject};
use crate::traits::BlobStore;

const META_SUFFIX: &str = "meta";

/// `[store]` section of the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding all stored objects.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("phoenix-data")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

/// A [`BlobStore`] keeping one file per key under a root directory.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (creating if necessary) the store rooted at `config.root`.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        fs::create_dir_all(&config.root)?;
        debug!(root = %config.root.display(), "opened filesystem blob store");
        Ok(Self {
            root: config.root.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Data and metadata paths for `key`.
    fn paths(&self, key: &str) -> StoreResult<(PathBuf, PathBuf)> {
        let (kind, id) = KeyKind::split(key)?;
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::UnsupportedKey {
                key: key.to_string(),
                reason: "identifier must be alphanumeric, '-' or '_'".into(),
            });
        }
        let dir = self.root.join(kind.to_string());
        Ok((dir.join(id), dir.join(format!("{id}.{META_SUFFIX}"))))
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove_optional(path: &Path) -> StoreResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, object: &StoredObject) -> StoreResult<()> {
        let (data_path, meta_path) = self.paths(key)?;
        let header = serde_json::to_vec(&object.header())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Header first: a visible payload always has its metadata beside it.
        Self::write_atomic(&meta_path, &header)?;
        Self::write_atomic(&data_path, &object.data)?;
        debug!(key, size = object.size(), "stored object");
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let (data_path, meta_path) = self.paths(key)?;
        let Some(data) = Self::read_optional(&data_path)? else {
            return Ok(None);
        };
        let header = match Self::read_optional(&meta_path)? {
            Some(bytes) => serde_json::from_slice::<ObjectHeader>(&bytes)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            None => ObjectHeader::default(),
        };
        Ok(Some(StoredObject::from_parts(data, header)))
    }

    fn delete_many(&self, keys: &[String]) -> StoreResult<()> {
        let paths = keys
            .iter()
            .map(|k| self.paths(k))
            .collect::<StoreResult<Vec<_>>>()?;
        for (data_path, meta_path) in paths {
            Self::remove_optional(&data_path)?;
            Self::remove_optional(&meta_path)?;
        }
        debug!(count = keys.len(), "deleted objects");
        Ok(())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let (data_path, _) = self.paths(key)?;
        Ok(data_path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(&StoreConfig {
            root: dir.path().join("objects"),
        })
        .unwrap();
        (dir, store)
    }

    #[test]
    fn default_config_root() {
        assert_eq!(StoreConfig::default().root, PathBuf::from("phoenix-data"));
    }

    #[test]
    fn open_creates_root() {
        let (dir, store) = open_temp();
        assert!(dir.path().join("objects").is_dir());
        assert_eq!(store.root(), dir.path().join("objects"));
    }

    #[test]
    fn put_and_get_with_metadata() {
        let (_dir, store) = open_temp();
        let obj = StoredObject::json(br#"{"unsafe":"<h1>History</h1>"}"#.to_vec(), "Node");
        store.put("/node/0a1b2c", &obj).unwrap();

        let read_back = store.get("/node/0a1b2c").unwrap().expect("should exist");
        assert_eq!(read_back, obj);
        assert_eq!(read_back.type_name(), Some("Node"));
        assert!(store.root().join("node").join("0a1b2c").is_file());
    }

    #[test]
    fn put_overwrites() {
        let (_dir, store) = open_temp();
        store
            .put("/page/abc", &StoredObject::json(b"1".to_vec(), "Page"))
            .unwrap();
        store
            .put("/page/abc", &StoredObject::json(b"2".to_vec(), "Page"))
            .unwrap();
        assert_eq!(store.get("/page/abc").unwrap().unwrap().data, b"2");
    }

    #[test]
    fn get_missing_returns_none() {
        let (_dir, store) = open_temp();
        assert!(store.get("/page/nothing").unwrap().is_none());
        assert!(!store.exists("/page/nothing").unwrap());
    }

    #[test]
    fn missing_metadata_reads_as_empty_header() {
        let (_dir, store) = open_temp();
        let obj = StoredObject::json(b"{}".to_vec(), "Thing");
        store.put("/data/abc", &obj).unwrap();
        fs::remove_file(store.root().join("data").join("abc.meta")).unwrap();

        let read_back = store.get("/data/abc").unwrap().unwrap();
        assert_eq!(read_back.data, b"{}");
        assert!(read_back.metadata.is_empty());
    }

    #[test]
    fn delete_many_removes_data_and_metadata() {
        let (_dir, store) = open_temp();
        let obj = StoredObject::json(b"{}".to_vec(), "Thing");
        store.put("/data/a", &obj).unwrap();
        store.put("/data/b", &obj).unwrap();

        store
            .delete_many(&["/data/a".into(), "/data/missing".into()])
            .unwrap();
        assert!(!store.exists("/data/a").unwrap());
        assert!(!store.root().join("data").join("a.meta").exists());
        assert!(store.exists("/data/b").unwrap());
    }

    #[test]
    fn rejects_path_traversal() {
        let (_dir, store) = open_temp();
        let obj = StoredObject::json(b"{}".to_vec(), "Page");
        let err = store.put("/page/../escape", &obj).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedKey { .. }));
        assert!(store.get("/page/a.meta").is_err());
    }

    #[test]
    fn rejects_unknown_key_shapes() {
        let (_dir, store) = open_temp();
        let err = store.get("/bogus/abc").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            root: dir.path().to_path_buf(),
        };
        FsBlobStore::open(&config)
            .unwrap()
            .put("/topics/abc", &StoredObject::json(b"[]".to_vec(), "[]RelatedTopic"))
            .unwrap();

        let store = FsBlobStore::open(&config).unwrap();
        assert_eq!(store.get("/topics/abc").unwrap().unwrap().data, b"[]");
    }
}
