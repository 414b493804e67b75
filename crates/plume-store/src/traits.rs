use plume_types::StorageKey;

use crate::error::StoreResult;

/// Key-addressed, write-once record storage.
///
/// All implementations must satisfy these invariants:
/// - A key holds at most one record, and a written record is never replaced.
/// - `put_if_absent` is atomic: readers see either no record or the whole
///   record, never a prefix of it.
/// - Reads never block on writers for longer than the publish step.
/// - The store never interprets record bytes.
pub trait PostStore: Send + Sync {
    /// Write `data` under `key` unless the key is already occupied.
    ///
    /// Returns [`StoreError::AlreadyExists`] when the key holds a record; the
    /// existing record is left untouched.
    ///
    /// [`StoreError::AlreadyExists`]: crate::StoreError::AlreadyExists
    fn put_if_absent(&self, key: &StorageKey, data: &[u8]) -> StoreResult<()>;

    /// Read the record bytes at `key`.
    ///
    /// Returns `Ok(None)` if the key is free.
    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>>;

    /// Every stored entry, in the backend's deterministic order.
    fn list_all(&self) -> StoreResult<Vec<(StorageKey, Vec<u8>)>>;

    /// Number of stored records.
    ///
    /// Default implementation lists everything. Backends may override.
    fn len(&self) -> StoreResult<usize> {
        Ok(self.list_all()?.len())
    }

    /// Returns `true` if a record exists at `key`.
    fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
