//! Location ID and Map ID encoding (data model §3).
use crate::error::{DnsDbError, DnsDbResult};

/// Either the distinguished zero ID (`{0,0}`, meaning "no location") or a
/// short/long form identifier scoping a record to a client subset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LocationId {
    None,
    Short([u8; 2]),
    Long(Vec<u8>),
}

const LONG_SENTINEL: u8 = 0xFF;

impl LocationId {
    pub fn none() -> Self {
        LocationId::None
    }

    pub fn short(id: u16) -> Self {
        LocationId::Short(id.to_be_bytes())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, LocationId::None) || matches!(self, LocationId::Short([0, 0]))
    }

    /// Parses a location field as it appears in source text / subnet
    /// assignments: empty means "no location", exactly 2 bytes is a short
    /// ID literal. Anything else is `InvalidLocation` — this is the check
    /// spec §4.B's "failure semantics" requires before any range point is
    /// emitted for the offending input.
    pub fn from_raw(bytes: &[u8]) -> DnsDbResult<Self> {
        match bytes.len() {
            0 => Ok(LocationId::None),
            2 => Ok(LocationId::Short([bytes[0], bytes[1]])),
            n => Err(DnsDbError::InvalidLocation(n)),
        }
    }

    /// Encodes as it is stored inline in an RR row or range-point value:
    /// the zero ID is two zero bytes, a short ID is its 2 bytes verbatim,
    /// and a long ID is prefixed by the `0xFF` sentinel and a length byte.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            LocationId::None => vec![0, 0],
            LocationId::Short(b) => b.to_vec(),
            LocationId::Long(b) => {
                let mut out = Vec::with_capacity(b.len() + 2);
                out.push(LONG_SENTINEL);
                out.push(b.len() as u8);
                out.extend_from_slice(b);
                out
            }
        }
    }

    /// Decodes from the head of `bytes`, returning the decoded ID and the
    /// number of bytes consumed. An empty slice decodes to the zero ID
    /// (used when a range point's value carries no location at all).
    pub fn decode(bytes: &[u8]) -> DnsDbResult<(Self, usize)> {
        if bytes.is_empty() {
            return Ok((LocationId::None, 0));
        }
        if bytes[0] == LONG_SENTINEL {
            if bytes.len() < 2 {
                return Err(DnsDbError::UnexpectedEof);
            }
            let len = bytes[1] as usize;
            if bytes.len() < 2 + len {
                return Err(DnsDbError::UnexpectedEof);
            }
            return Ok((LocationId::Long(bytes[2..2 + len].to_vec()), 2 + len));
        }
        if bytes.len() < 2 {
            return Err(DnsDbError::UnexpectedEof);
        }
        let id = [bytes[0], bytes[1]];
        if id == [0, 0] {
            Ok((LocationId::None, 2))
        } else {
            Ok((LocationId::Short(id), 2))
        }
    }
}

impl Default for LocationId {
    fn default() -> Self {
        LocationId::None
    }
}

/// A 2-byte identifier naming a resolver-IP map or ECS map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MapId(pub [u8; 2]);

impl MapId {
    pub const ZERO: MapId = MapId([0, 0]);

    pub fn from_bytes(bytes: &[u8]) -> DnsDbResult<Self> {
        if bytes.len() != 2 {
            return Err(DnsDbError::InvalidLocation(bytes.len()));
        }
        Ok(MapId([bytes[0], bytes[1]]))
    }
}

/// The two map classes a zone can bind an owner name to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MapClass {
    Resolver,
    Ecs,
}

impl MapClass {
    pub fn key_prefix(&self) -> &'static [u8] {
        match self {
            MapClass::Resolver => b"\x00M",
            MapClass::Ecs => b"\x008",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_id_is_none() {
        assert!(LocationId::none().is_none());
        assert!(LocationId::Short([0, 0]).is_none());
        assert!(!LocationId::short(7).is_none());
    }

    #[test]
    fn from_raw_rejects_odd_lengths() {
        assert!(LocationId::from_raw(&[1, 2, 3]).is_err());
        assert!(LocationId::from_raw(&[1]).is_err());
        assert!(LocationId::from_raw(&[]).unwrap().is_none());
        assert!(LocationId::from_raw(&[0, 7]).is_ok());
    }

    #[test]
    fn encode_decode_round_trips_short_and_long() {
        let short = LocationId::short(0x0102);
        let (decoded, consumed) = LocationId::decode(&short.encode()).unwrap();
        assert_eq!(decoded, short);
        assert_eq!(consumed, 2);

        let long = LocationId::Long(vec![1, 2, 3, 4, 5]);
        let (decoded, consumed) = LocationId::decode(&long.encode()).unwrap();
        assert_eq!(decoded, long);
        assert_eq!(consumed, 7);
    }
}
