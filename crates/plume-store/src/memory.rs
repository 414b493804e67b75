use std::collections::HashMap;
use std::sync::RwLock;

use plume_types::StorageKey;

use crate::error::{StoreError, StoreResult};
use crate::traits::PostStore;

/// In-memory post store.
///
/// Intended for tests and embedding. Entries are held behind a `RwLock`;
/// `list_all` returns them in insertion order.
pub struct InMemoryPostStore {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    order: Vec<StorageKey>,
    entries: HashMap<StorageKey, Vec<u8>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryState::default()),
        }
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PostStore for InMemoryPostStore {
    fn put_if_absent(&self, key: &StorageKey, data: &[u8]) -> StoreResult<()> {
        let mut state = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if state.entries.contains_key(key) {
            return Err(StoreError::AlreadyExists(*key));
        }
        state.entries.insert(*key, data.to_vec());
        state.order.push(*key);
        Ok(())
    }

    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.entries.get(key).cloned())
    }

    fn list_all(&self) -> StoreResult<Vec<(StorageKey, Vec<u8>)>> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state
            .order
            .iter()
            .filter_map(|key| state.entries.get(key).map(|data| (*key, data.clone())))
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        let state = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.order.len())
    }
}

impl std::fmt::Debug for InMemoryPostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryPostStore")
            .field("record_count", &count)
            .finish()
    }
}
