//! Key-class byte layouts (data model §3, "Key classes" table). Centralized
//! here so the record codec, the compiler and every lookup module agree on
//! one encoding.
use std::net::Ipv6Addr;

use crate::location::MapClass;
use crate::name::{PackedName, ReversedName};

pub const FEATURES_KEY: &[u8] = b"\x00o_features";
pub const RANGE_POINT_PREFIX: &[u8] = b"\x00\x00\x00!";

bitflags::bitflags! {
    /// The 4-byte little-endian bitmap stored under [`FEATURES_KEY`].
    #[derive(Default, Debug, PartialEq, Eq)]
    pub struct Features: u32 {
        const V1_KEYS = 0b0000_0001;
        const V2_KEYS = 0b0000_0010;
    }
}

impl Features {
    pub fn encode(&self) -> [u8; 4] {
        self.bits().to_le_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Self {
        if bytes.len() < 4 {
            return Features::empty();
        }
        Features::from_bits_truncate(u32::from_le_bytes(bytes[0..4].try_into().unwrap()))
    }
}

/// Which record key schema is active. V1 predates the reversed-name
/// closest-key-≤ scheme; V2 is required for wildcard/ancestor lookups via
/// [`crate::store::KvStore::closest_key_le`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    V1,
    V2,
}

/// `loc(2) ‖ packed-name` (V1 resource-record key).
pub fn rr_key_v1(loc_short: [u8; 2], name: &PackedName) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + name.0.len());
    key.extend_from_slice(&loc_short);
    key.extend_from_slice(&name.0);
    key
}

/// `"\x00o" ‖ reversed-name ‖ loc(2)` (V2 resource-record key).
pub fn rr_key_v2(reversed: &ReversedName, loc_short: [u8; 2]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + reversed.0.len() + 2);
    key.extend_from_slice(b"\x00o");
    key.extend_from_slice(&reversed.0);
    key.extend_from_slice(&loc_short);
    key
}

/// `map-class-prefix ‖ owner-name ‖ ('=' | '*')`.
pub fn map_binding_key(class: MapClass, name: &PackedName, wildcard: bool) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + name.0.len() + 1);
    key.extend_from_slice(class.key_prefix());
    key.extend_from_slice(&name.0);
    key.push(if wildcard { b'*' } else { b'=' });
    key
}

/// `map-class-prefix ‖ reversed-name ‖ ('=' | '*')` (V2 schema probe key).
pub fn map_binding_key_reversed(class: MapClass, reversed: &ReversedName, wildcard: bool) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + reversed.0.len() + 1);
    key.extend_from_slice(class.key_prefix());
    key.extend_from_slice(&reversed.0);
    key.push(if wildcard { b'*' } else { b'=' });
    key
}

/// `"\x00\x00\x00!" ‖ map-id(2) ‖ ipv6(16) ‖ mask-len(1)` range-point key.
pub fn range_point_key(map_id: [u8; 2], ip: Ipv6Addr, mask_len: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(RANGE_POINT_PREFIX.len() + 2 + 16 + 1);
    key.extend_from_slice(RANGE_POINT_PREFIX);
    key.extend_from_slice(&map_id);
    key.extend_from_slice(&ip.octets());
    key.push(mask_len);
    key
}
