//! Client address → location lookup (component F). V2 resolves in one
//! `closest_key_le` probe over the rearranged range-point stream; V1 is
//! the legacy descending mask-length bitmap scan it replaced.
use std::net::Ipv6Addr;

use crate::error::DnsDbResult;
use crate::keys::{self, RANGE_POINT_PREFIX};
use crate::location::LocationId;
use crate::store::{decode_chunks, KvStore};
use crate::subnet::mask_addr;

/// V2 scheme: the range points produced by [`crate::subnet::rearrange`]
/// are stored in ip-ascending order, so the point governing `ip` is
/// exactly the greatest stored point at or below it (its kind does not
/// matter at lookup time: an End point's location already reflects the
/// enclosing range, per the rearranger's stack-pop step).
pub fn lookup_v2(store: &dyn KvStore, map_id: [u8; 2], ip: Ipv6Addr) -> DnsDbResult<LocationId> {
    let mut probe = Vec::with_capacity(RANGE_POINT_PREFIX.len() + 2 + 16 + 1);
    probe.extend_from_slice(RANGE_POINT_PREFIX);
    probe.extend_from_slice(&map_id);
    probe.extend_from_slice(&ip.octets());
    probe.push(0xFF);

    let Some((found_key, value)) = store.closest_key_le(&probe)? else {
        return Ok(LocationId::none());
    };
    let own_prefix_len = RANGE_POINT_PREFIX.len() + 2;
    if found_key.len() < own_prefix_len || &found_key[..RANGE_POINT_PREFIX.len()] != RANGE_POINT_PREFIX {
        return Ok(LocationId::none());
    }
    if &found_key[RANGE_POINT_PREFIX.len()..own_prefix_len] != map_id {
        return Ok(LocationId::none());
    }

    let chunks = decode_chunks(&value)?;
    let loc_bytes = chunks.first().copied().unwrap_or(&[]);
    LocationId::from_raw(loc_bytes)
}

/// V1 scheme: probes `/128` down to `/0` in descending order and returns
/// the first mask length with a stored point, masking the query address
/// to that length before each lookup. `separate_masklens` mirrors the
/// `FBDNS_SEPARATE_MASKLENS` toggle: when set, each mask length owns a
/// disjoint key slice (`mask_len` is part of the key) instead of sharing
/// one slice keyed only by the masked address.
pub fn lookup_v1(store: &dyn KvStore, map_id: [u8; 2], ip: Ipv6Addr, separate_masklens: bool) -> DnsDbResult<LocationId> {
    for mask_len in (0..=128u8).rev() {
        let masked = mask_addr(ip, mask_len);
        let key = if separate_masklens {
            keys::range_point_key(map_id, masked, mask_len)
        } else {
            keys::range_point_key(map_id, masked, 0)
        };
        if let Some(value) = store.get(&key)? {
            let chunks = decode_chunks(&value)?;
            let loc_bytes = chunks.first().copied().unwrap_or(&[]);
            return LocationId::from_raw(loc_bytes);
        }
    }
    Ok(LocationId::none())
}
