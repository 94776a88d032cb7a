//! Authority resolver (component I): a single ascent from the query name
//! toward the root that stops at the first name carrying NS records (the
//! zone cut) or at the root itself, recording whether SOA co-resides
//! there to distinguish authoritative from delegated.
use crate::error::DnsDbResult;
use crate::keys;
use crate::location::LocationId;
use crate::name::{self, PackedName};
use crate::record::{DecodedRow, TYPE_NS, TYPE_SOA};
use crate::record_iter;
use crate::store::KvStore;

/// The name the ascent stopped at, and what it found there.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneCut {
    pub owner: PackedName,
    pub soa: Option<DecodedRow>,
    pub ns_rows: Vec<DecodedRow>,
}

impl ZoneCut {
    /// True when the stop name carries both NS and SOA: the query is
    /// inside a zone this crate actually serves, not behind a referral.
    pub fn is_authoritative(&self) -> bool {
        self.soa.is_some()
    }

    /// True when the stop name carries NS but no SOA: a delegation to
    /// another nameserver, answered with a referral rather than data.
    pub fn is_delegation(&self) -> bool {
        self.soa.is_none() && !self.ns_rows.is_empty()
    }
}

fn rows_at_unlocated(store: &dyn KvStore, name: &PackedName) -> DnsDbResult<Vec<DecodedRow>> {
    let key = keys::rr_key_v2(&name::reverse(name), [0, 0]);
    record_iter::rows_at(store, &key)
}

/// Ascends from `qname` to the root, stopping at the first name that
/// carries NS records — that name is the zone cut by definition — or at
/// the root if none ever does. SOA presence at the stop name (not
/// anywhere higher) decides authoritative vs. delegation.
pub fn find_zone_cut(store: &dyn KvStore, qname: &PackedName) -> DnsDbResult<ZoneCut> {
    let mut cur = qname.clone();
    loop {
        let rows = rows_at_unlocated(store, &cur)?;
        let soa = rows.iter().find(|r| r.rtype == TYPE_SOA).cloned();
        let ns_rows: Vec<DecodedRow> = rows.into_iter().filter(|r| r.rtype == TYPE_NS).collect();

        if !ns_rows.is_empty() || cur.label_count() == 0 {
            return Ok(ZoneCut { owner: cur, soa, ns_rows });
        }

        match cur.strip_leading_label() {
            Some(parent) => cur = parent,
            None => return Ok(ZoneCut { owner: cur, soa, ns_rows }),
        }
    }
}

/// Used by the authority path to decide whether a location-scoped
/// lookup should even be attempted for SOA/NS data (it should not: these
/// are always global).
pub fn zone_records_are_unlocated() -> LocationId {
    LocationId::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{encode_row, PrimitiveRr};
    use crate::store::MemStore;

    fn put(store: &MemStore, owner: &str, rr: PrimitiveRr) {
        let key = keys::rr_key_v2(&name::reverse(&name::pack(owner).unwrap()), [0, 0]);
        store.add(&key, &encode_row(&rr).unwrap()).unwrap();
    }

    fn soa_rr(owner: &str) -> PrimitiveRr {
        PrimitiveRr {
            owner: owner.into(),
            rtype: TYPE_SOA,
            is_wildcard: false,
            loc: Vec::new(),
            ttl: 3600,
            weight: None,
            rdata: vec![0; 20],
        }
    }

    fn ns_rr(owner: &str) -> PrimitiveRr {
        PrimitiveRr {
            owner: owner.into(),
            rtype: TYPE_NS,
            is_wildcard: false,
            loc: Vec::new(),
            ttl: 3600,
            weight: None,
            rdata: name::pack("ns1.example.com").unwrap().0,
        }
    }

    #[test]
    fn stops_at_apex_when_ns_and_soa_coreside() {
        let store = MemStore::new();
        put(&store, "example.com", soa_rr("example.com"));
        put(&store, "example.com", ns_rr("example.com"));
        let cut = find_zone_cut(&store, &name::pack("example.com").unwrap()).unwrap();
        assert_eq!(cut.owner, name::pack("example.com").unwrap());
        assert!(cut.is_authoritative());
        assert!(!cut.is_delegation());
    }

    #[test]
    fn ascends_past_empty_names_to_the_enclosing_apex() {
        let store = MemStore::new();
        put(&store, "example.com", soa_rr("example.com"));
        put(&store, "example.com", ns_rr("example.com"));
        let cut = find_zone_cut(&store, &name::pack("deep.sub.example.com").unwrap()).unwrap();
        assert_eq!(cut.owner, name::pack("example.com").unwrap());
        assert!(cut.is_authoritative());
    }

    #[test]
    fn stops_at_the_delegation_point_not_the_enclosing_apex() {
        let store = MemStore::new();
        put(&store, "example.com", soa_rr("example.com"));
        put(&store, "example.com", ns_rr("example.com"));
        put(&store, "nonauth.example.com", ns_rr("nonauth.example.com"));
        let cut = find_zone_cut(&store, &name::pack("foo.nonauth.example.com").unwrap()).unwrap();
        assert_eq!(cut.owner, name::pack("nonauth.example.com").unwrap());
        assert!(cut.is_delegation());
        assert!(!cut.is_authoritative());
        assert_eq!(cut.ns_rows.len(), 1);
    }

    #[test]
    fn ascends_to_the_root_when_no_ns_is_ever_found() {
        let store = MemStore::new();
        let cut = find_zone_cut(&store, &name::pack("foo.example.com").unwrap()).unwrap();
        assert_eq!(cut.owner, name::pack("").unwrap());
        assert!(cut.ns_rows.is_empty());
        assert!(cut.soa.is_none());
        assert!(!cut.is_authoritative());
        assert!(!cut.is_delegation());
    }
}
