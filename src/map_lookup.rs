//! Owner-name → map ID lookup (component E). Two schemes share one
//! result shape: V1 walks the name's ancestor chain issuing a single
//! batched `multi_get`; V2 drives `closest_key_le` with a cut-and-retry
//! loop so a single probe (amortized) finds the longest bound ancestor.
use crate::error::DnsDbResult;
use crate::keys;
use crate::location::{MapClass, MapId};
use crate::name::{self, PackedName, ReversedName};
use crate::store::{decode_chunks, KvStore};

/// The outcome of a successful map bind: which map, and whether the
/// match came from a wildcard binding or an exact owner name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapMatch {
    pub map_id: MapId,
    pub via_wildcard: bool,
}

fn ancestors(name: &PackedName) -> Vec<PackedName> {
    let mut out = vec![name.clone()];
    let mut cur = name.clone();
    while let Some(parent) = cur.strip_leading_label() {
        out.push(parent.clone());
        cur = parent;
    }
    out
}

fn decode_map_id(value: &[u8]) -> DnsDbResult<MapId> {
    let chunks = decode_chunks(value)?;
    let first = chunks.first().copied().unwrap_or(&[]);
    MapId::from_bytes(first)
}

/// V1 scheme: for every ancestor of `name` (most specific first), probes
/// the exact-owner key then the wildcard-owner key, and returns the
/// first hit. One `multi_get` batches all candidate keys for a name.
pub fn lookup_v1(store: &dyn KvStore, class: MapClass, name: &PackedName) -> DnsDbResult<Option<MapMatch>> {
    let chain = ancestors(name);
    let mut candidates = Vec::with_capacity(chain.len() * 2);
    for ancestor in &chain {
        candidates.push(keys::map_binding_key(class, ancestor, false));
        candidates.push(keys::map_binding_key(class, ancestor, true));
    }
    let values = store.multi_get(&candidates)?;
    for (i, value) in values.into_iter().enumerate() {
        if let Some(v) = value {
            return Ok(Some(MapMatch {
                map_id: decode_map_id(&v)?,
                via_wildcard: i % 2 == 1,
            }));
        }
    }
    Ok(None)
}

const MAX_CUT_RETRIES: usize = 64;

/// V2 scheme: probes `closest_key_le` on the reversed name under the
/// map class's prefix. A hit whose stored name is an ancestor-or-self of
/// the query is accepted; otherwise the stored key only shares a shorter
/// label prefix than its own length, so it cannot bind the query, and the
/// probe is retried against that shorter prefix (it cannot bind a longer
/// one either, since V2 keys sort ancestors before descendants).
pub fn lookup_v2(store: &dyn KvStore, class: MapClass, name: &PackedName) -> DnsDbResult<Option<MapMatch>> {
    let mut probe = name::reverse(name);

    for _ in 0..MAX_CUT_RETRIES {
        let probe_key = probe_key_upper_bound(class, &probe);
        let Some((found_key, value)) = store.closest_key_le(&probe_key)? else {
            return Ok(None);
        };
        let Some((stored_reversed, via_wildcard)) = decode_binding_key(class, &found_key) else {
            return Ok(None);
        };

        let lcp = name::longest_common_label_prefix(&stored_reversed.0, &probe.0);
        let stored_label_count = name::labels(&stored_reversed.0).len();

        if lcp == stored_label_count {
            return Ok(Some(MapMatch {
                map_id: decode_map_id(&value)?,
                via_wildcard,
            }));
        }
        if lcp == 0 {
            return Ok(None);
        }
        probe = cut_to_label_count(&probe, lcp);
    }
    Ok(None)
}

fn probe_key_upper_bound(class: MapClass, reversed: &ReversedName) -> Vec<u8> {
    // '*' (0x2A) < '=' (0x3D): probing with a byte above both markers
    // finds the greatest binding (exact or wildcard) at or below this name.
    let mut key = Vec::with_capacity(class.key_prefix().len() + reversed.0.len() + 1);
    key.extend_from_slice(class.key_prefix());
    key.extend_from_slice(&reversed.0);
    key.push(0xFF);
    key
}

fn decode_binding_key(class: MapClass, key: &[u8]) -> Option<(ReversedName, bool)> {
    let prefix = class.key_prefix();
    if key.len() < prefix.len() + 1 || &key[..prefix.len()] != prefix {
        return None;
    }
    let marker = *key.last().unwrap();
    let via_wildcard = marker == b'*';
    if marker != b'*' && marker != b'=' {
        return None;
    }
    let body = &key[prefix.len()..key.len() - 1];
    Some((ReversedName(body.to_vec()), via_wildcard))
}

fn cut_to_label_count(reversed: &ReversedName, count: usize) -> ReversedName {
    let ls = name::labels(&reversed.0);
    let mut out = Vec::new();
    for label in ls.iter().take(count) {
        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }
    out.push(0);
    ReversedName(out)
}
