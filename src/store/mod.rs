//! Storage abstraction (component D): an ordered byte-key store with
//! point, prefix-iteration and closest-key-≤ operations, plus a bulk
//! builder for compile-time ingestion and a secondary-replica catch-up
//! surface for live reload.
//!
//! The production backend is the embedded LSM engine, which this crate
//! treats as an external collaborator (spec §1 "out of scope"). [`MemStore`]
//! is the one concrete, in-process implementation of this trait, used to
//! exercise every other component end-to-end in tests without that engine.
use crate::error::{DnsDbError, DnsDbResult};

mod mem;
pub use mem::{MemBulkBuilder, MemStore};

/// Ordered byte-key store. All mutation goes through `add`/`delete`
/// (multi-chunk framing, §3 "All values carry a framing header") rather
/// than raw `put`, so a single key can hold more than one RR row.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> DnsDbResult<Option<Vec<u8>>>;
    fn put(&self, key: &[u8], value: Vec<u8>) -> DnsDbResult<()>;
    fn delete_key(&self, key: &[u8]) -> DnsDbResult<()>;

    fn multi_get(&self, keys: &[Vec<u8>]) -> DnsDbResult<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    /// Calls `f` on each chunk of the multi-value stored at the exact key,
    /// in insertion order, until `f` returns `Ok(false)` (stop) or the
    /// chunks are exhausted.
    fn for_each_prefix(&self, key: &[u8], f: &mut dyn FnMut(&[u8]) -> DnsDbResult<bool>) -> DnsDbResult<()> {
        if let Some(value) = self.get(key)? {
            for chunk in decode_chunks(&value)? {
                if !f(chunk)? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Returns the greatest stored key ≤ `key`, with its raw multi-value.
    /// Mandatory only when the V2 schema is active.
    fn closest_key_le(&self, key: &[u8]) -> DnsDbResult<Option<(Vec<u8>, Vec<u8>)>>;

    /// Appends `chunk` to the multi-value at `key` (creating it if absent).
    fn add(&self, key: &[u8], chunk: &[u8]) -> DnsDbResult<()> {
        let mut value = self.get(key)?.unwrap_or_default();
        append_chunk(&mut value, chunk);
        self.put(key, value)
    }

    /// Removes the first chunk at `key` matching `chunk` byte-for-byte.
    /// Deleting the last chunk removes the key entirely. `NxKey`/`NxVal`
    /// are returned for a missing key / missing chunk respectively.
    fn delete(&self, key: &[u8], chunk: &[u8]) -> DnsDbResult<()> {
        let Some(value) = self.get(key)? else {
            return Err(DnsDbError::NxKey(format!("{:02x?}", key)));
        };
        let chunks = decode_chunks(&value)?;
        let idx = chunks
            .iter()
            .position(|c| *c == chunk)
            .ok_or_else(|| DnsDbError::NxVal(format!("{:02x?}", key)))?;

        if chunks.len() == 1 {
            self.delete_key(key)
        } else {
            let mut rebuilt = Vec::with_capacity(value.len());
            for (i, c) in chunks.iter().enumerate() {
                if i != idx {
                    append_chunk(&mut rebuilt, c);
                }
            }
            self.put(key, rebuilt)
        }
    }
}

/// Appends one `u32_le(len) ‖ chunk` frame to `value`.
pub fn append_chunk(value: &mut Vec<u8>, chunk: &[u8]) {
    value.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    value.extend_from_slice(chunk);
}

/// Splits a raw multi-value into its constituent chunks in insertion
/// order. The framing is self-delimiting: `sum(4 + len) == value.len()`.
pub fn decode_chunks(value: &[u8]) -> DnsDbResult<Vec<&[u8]>> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < value.len() {
        if value.len() - i < 4 {
            return Err(DnsDbError::ShortValue {
                expected: 4,
                found: value.len() - i,
            });
        }
        let len = u32::from_le_bytes(value[i..i + 4].try_into().unwrap()) as usize;
        i += 4;
        if value.len() - i < len {
            return Err(DnsDbError::ShortValue {
                expected: len,
                found: value.len() - i,
            });
        }
        out.push(&value[i..i + len]);
        i += len;
    }
    Ok(out)
}

/// One pre-sorted `(key, values)` batch handed to a [`BulkBuilder`].
pub struct SortedBatch {
    pub key: Vec<u8>,
    pub values: Vec<Vec<u8>>,
}

/// Accepts pre-sorted batches and writes them into immutable external
/// segments, later ingested into the live store in O(files) time.
pub trait BulkBuilder {
    fn write_segment(&mut self, batches: Vec<SortedBatch>) -> DnsDbResult<()>;
    /// Ingests all written segments into the live store. `hardlink`
    /// requests hard-linking the segment files instead of copying them.
    fn ingest(&mut self, hardlink: bool) -> DnsDbResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_framing_round_trips() {
        let mut value = Vec::new();
        append_chunk(&mut value, b"abc");
        append_chunk(&mut value, b"de");
        let chunks = decode_chunks(&value).unwrap();
        assert_eq!(chunks, vec![b"abc".as_slice(), b"de".as_slice()]);
    }

    #[test]
    fn truncated_framing_is_a_short_value_error() {
        let mut value = Vec::new();
        append_chunk(&mut value, b"abc");
        value.truncate(value.len() - 1);
        assert!(decode_chunks(&value).is_err());
    }
}
