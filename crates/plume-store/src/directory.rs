use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use plume_types::StorageKey;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::PostStore;

const RECORD_EXT: &str = "post";

/// Durable post store: one file per key under a root directory.
///
/// A record is written to a temporary file in the same directory, synced,
/// and then published under `<hex key>.post` with a no-clobber rename. The
/// rename is the commit point, so readers see the whole file or nothing,
/// and a second writer for the same key fails instead of replacing it.
///
/// `list_all` orders entries by key.
#[derive(Debug)]
pub struct DirectoryPostStore {
    root: PathBuf,
}

impl DirectoryPostStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened directory post store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root.join(format!("{}.{RECORD_EXT}", key.to_hex()))
    }

    /// Keys of every published record. A `.post` file whose name is not a
    /// key was not written by this store and is skipped.
    fn record_keys(&self) -> StoreResult<Vec<StorageKey>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            // Temp files from in-flight writes have no `.post` extension.
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|stem| StorageKey::from_hex(stem).ok())
            {
                Some(key) => keys.push(key),
                None => warn!(path = %path.display(), "skipping unrecognised record file"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl PostStore for DirectoryPostStore {
    fn put_if_absent(&self, key: &StorageKey, data: &[u8]) -> StoreResult<()> {
        let target = self.path_for(key);
        if target.exists() {
            return Err(StoreError::AlreadyExists(*key));
        }

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&target) {
            Ok(_) => {
                debug!(key = %key.short_id(), bytes = data.len(), "record published");
                Ok(())
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(*key))
            }
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }

    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_all(&self) -> StoreResult<Vec<(StorageKey, Vec<u8>)>> {
        let mut entries = Vec::new();
        for key in self.record_keys()? {
            // Records are never deleted, so a listed key is always readable.
            let data = fs::read(self.path_for(&key))?;
            entries.push((key, data));
        }
        Ok(entries)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.record_keys()?.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use super::*;

    fn key(seed: u8) -> StorageKey {
        StorageKey::from_bytes([seed; 32])
    }

    #[test]
    fn put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPostStore::open(dir.path()).unwrap();
        store.put_if_absent(&key(1), b"hello").unwrap();
        assert_eq!(store.get(&key(1)).unwrap().unwrap(), b"hello");
        assert!(store.get(&key(2)).unwrap().is_none());
    }

    #[test]
    fn occupied_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPostStore::open(dir.path()).unwrap();
        store.put_if_absent(&key(1), b"first").unwrap();
        assert!(matches!(
            store.put_if_absent(&key(1), b"second"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(store.get(&key(1)).unwrap().unwrap(), b"first");
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DirectoryPostStore::open(dir.path()).unwrap();
            store.put_if_absent(&key(3), b"durable").unwrap();
        }
        let reopened = DirectoryPostStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get(&key(3)).unwrap().unwrap(), b"durable");
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn list_all_is_ordered_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPostStore::open(dir.path()).unwrap();
        for seed in [9, 2, 5] {
            store.put_if_absent(&key(seed), &[seed]).unwrap();
        }
        let keys: Vec<_> = store.list_all().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![key(2), key(5), key(9)]);
    }

    #[test]
    fn stray_temp_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPostStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(".tmpABC123"), b"partial").unwrap();
        store.put_if_absent(&key(1), b"x").unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn foreign_record_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryPostStore::open(dir.path()).unwrap();
        store.put_if_absent(&key(1), b"kept").unwrap();
        fs::write(dir.path().join("not-a-key.post"), b"?").unwrap();
        fs::write(dir.path().join("abcd.post"), b"?").unwrap();

        assert_eq!(store.list_all().unwrap(), vec![(key(1), b"kept".to_vec())]);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn racing_writers_on_one_key_have_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DirectoryPostStore::open(dir.path()).unwrap());
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (i, store.put_if_absent(&key(7), &[i; 64]))
                })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            match handle.join().unwrap() {
                (i, Ok(())) => winners.push(i),
                (_, Err(StoreError::AlreadyExists(k))) => assert_eq!(k, key(7)),
                (_, Err(other)) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(store.get(&key(7)).unwrap().unwrap(), vec![winners[0]; 64]);
        assert_eq!(store.len().unwrap(), 1);
    }
}
