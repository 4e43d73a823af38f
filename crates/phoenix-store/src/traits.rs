use crate::error::StoreResult;
use crate::object::StoredObject;

/// Key/value blob store.
///
/// All implementations must satisfy these invariants:
/// - `put` overwrites any object already stored under the key.
/// - A missing key reads as `Ok(None)`; only genuine failures are `Err`.
/// - Keys carry a kind prefix (`/page/`, `/node/`, `/data/`, `/topics/`);
///   implementations reject keys of any other shape.
/// - The store never interprets object contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Store `object` under `key`, replacing any previous object.
    fn put(&self, key: &str, object: &StoredObject) -> StoreResult<()>;

    /// Read the object stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;

    /// Delete every listed key. Keys that do not exist are skipped.
    fn delete_many(&self, keys: &[String]) -> StoreResult<()>;

    /// Check whether an object exists under `key`.
    ///
    /// Default implementation reads the object. Backends may override.
    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
