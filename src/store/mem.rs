//! An in-memory, lock-guarded `BTreeMap` implementation of [`KvStore`].
//! Stands in for the production embedded LSM engine in tests: not a
//! production backend, just enough of a real ordered store to exercise
//! every other component honestly.
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use crate::error::{DnsDbError, DnsDbResult};
use crate::store::{BulkBuilder, KvStore, SortedBatch};

#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots every (key, raw value) pair, sorted. Used by the
    /// secondary-replica catch-up path and by tests asserting byte-for-byte
    /// store equality after a diff round trip.
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replays every (key, value) pair from `primary` into `self`,
    /// overwriting local state. Models replaying newly-sealed segments and
    /// write-ahead-log entries from a primary writer (spec §4.D
    /// "secondary-replica mode").
    pub fn catch_up_with_primary(&self, primary: &MemStore) -> DnsDbResult<()> {
        let snapshot = primary.snapshot();
        let mut guard = self.inner.write().unwrap();
        guard.clear();
        for (k, v) in snapshot {
            guard.insert(k, v);
        }
        Ok(())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> DnsDbResult<Option<Vec<u8>>> {
        Ok(self.inner.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: Vec<u8>) -> DnsDbResult<()> {
        self.inner.write().unwrap().insert(key.to_vec(), value);
        Ok(())
    }

    fn delete_key(&self, key: &[u8]) -> DnsDbResult<()> {
        let mut guard = self.inner.write().unwrap();
        if guard.remove(key).is_none() {
            return Err(DnsDbError::NxKey(format!("{:02x?}", key)));
        }
        Ok(())
    }

    fn closest_key_le(&self, key: &[u8]) -> DnsDbResult<Option<(Vec<u8>, Vec<u8>)>> {
        let guard = self.inner.read().unwrap();
        Ok(guard
            .range((Bound::Unbounded, Bound::Included(key.to_vec())))
            .next_back()
            .map(|(k, v)| (k.clone(), v.clone())))
    }
}

/// A trivial bulk builder over [`MemStore`]: "segments" are just staged
/// batches in memory, and "ingestion" is a single merge pass into the live
/// map. Mirrors the shape of the real sort-merge-shard pipeline (spec
/// §4.K step 4) without needing real external files.
pub struct MemBulkBuilder {
    target: MemStore,
    staged: Vec<Vec<SortedBatch>>,
}

impl MemBulkBuilder {
    pub fn new(target: MemStore) -> Self {
        MemBulkBuilder {
            target,
            staged: Vec::new(),
        }
    }
}

impl BulkBuilder for MemBulkBuilder {
    fn write_segment(&mut self, batches: Vec<SortedBatch>) -> DnsDbResult<()> {
        self.staged.push(batches);
        Ok(())
    }

    fn ingest(&mut self, _hardlink: bool) -> DnsDbResult<()> {
        for segment in self.staged.drain(..) {
            for batch in segment {
                for value in batch.values {
                    self.target.add(&batch.key, &value)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_key_le_finds_the_greatest_key_at_or_below() {
        let store = MemStore::new();
        store.put(b"a", vec![1]).unwrap();
        store.put(b"c", vec![2]).unwrap();
        let (k, v) = store.closest_key_le(b"b").unwrap().unwrap();
        assert_eq!(k, b"a");
        assert_eq!(v, vec![1]);
    }

    #[test]
    fn add_then_delete_last_chunk_removes_key() {
        let store = MemStore::new();
        store.add(b"k", b"v1").unwrap();
        store.delete(b"k", b"v1").unwrap();
        assert!(store.get(b"k").unwrap().is_none());
    }

    #[test]
    fn delete_missing_key_is_nxkey() {
        let store = MemStore::new();
        assert!(matches!(store.delete(b"missing", b"x"), Err(DnsDbError::NxKey(_))));
    }

    #[test]
    fn catch_up_replays_primary_state() {
        let primary = MemStore::new();
        primary.put(b"a", vec![1]).unwrap();
        let secondary = MemStore::new();
        secondary.catch_up_with_primary(&primary).unwrap();
        assert_eq!(secondary.get(b"a").unwrap(), Some(vec![1]));
    }

    #[test]
    fn bulk_builder_ingests_segments_in_order() {
        let target = MemStore::new();
        let mut builder = MemBulkBuilder::new(target.clone());
        builder
            .write_segment(vec![SortedBatch {
                key: b"k".to_vec(),
                values: vec![b"a".to_vec(), b"b".to_vec()],
            }])
            .unwrap();
        builder.ingest(false).unwrap();

        let mut chunks = Vec::new();
        target
            .for_each_prefix(b"k", &mut |chunk| {
                chunks.push(chunk.to_vec());
                Ok(true)
            })
            .unwrap();
        assert_eq!(chunks, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
