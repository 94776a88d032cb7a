//! Record iterator (component G): walks the RR rows stored under a
//! single key, decoding each chunk with [`crate::record::decode_row`]
//! and exposing simple accept/ignore filtering by type and wildcard flag.
use crate::error::DnsDbResult;
use crate::record::{self, DecodedRow, TYPE_ANY, TYPE_CNAME};
use crate::store::KvStore;

/// Decodes every RR row chunk stored at `key`, in storage order. The
/// v2 schema's ordering (location-scoped rows before unlocated ones is
/// not guaranteed by this call alone — callers that care about location
/// preference filter the result, they don't rely on chunk order).
pub fn rows_at(store: &dyn KvStore, key: &[u8]) -> DnsDbResult<Vec<DecodedRow>> {
    let mut rows = Vec::new();
    let mut decode_err = None;
    store.for_each_prefix(key, &mut |chunk| match record::decode_row(chunk) {
        Ok(row) => {
            rows.push(row);
            Ok(true)
        }
        Err(e) => {
            decode_err = Some(e);
            Ok(false)
        }
    })?;
    if let Some(e) = decode_err {
        return Err(e);
    }
    Ok(rows)
}

/// Rows matching query type `rtype`, filtered by wildcard-flag match. A
/// row counts as a match when its own type equals `rtype`, when `rtype`
/// is the wildcard `ANY` query type, or when the row is a CNAME — a
/// CNAME answers any type query by aliasing, per the owner-name rule
/// that a name with a CNAME has no other RRset. The answer assembler
/// calls this once it knows which flag (plain vs wildcard) the owner it
/// resolved to actually used.
pub fn rows_of_type(rows: &[DecodedRow], rtype: u16, wildcard: bool) -> Vec<DecodedRow> {
    rows.iter()
        .filter(|r| r.is_wildcard == wildcard && (r.rtype == rtype || r.rtype == TYPE_CNAME || rtype == TYPE_ANY))
        .cloned()
        .collect()
}

/// True if any stored row at this owner is a plain (non-wildcard) row,
/// regardless of type — used to decide whether a name is "occupied" and
/// therefore terminates wildcard synthesis for its descendants.
pub fn has_plain_row(rows: &[DecodedRow]) -> bool {
    rows.iter().any(|r| !r.is_wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{encode_row, PrimitiveRr, TYPE_A, TYPE_NS};
    use crate::store::MemStore;

    fn rr(rtype: u16, wildcard: bool, rdata: Vec<u8>) -> PrimitiveRr {
        PrimitiveRr {
            owner: "x".into(),
            rtype,
            is_wildcard: wildcard,
            loc: Vec::new(),
            ttl: 60,
            weight: if rtype == TYPE_A { Some(1) } else { None },
            rdata,
        }
    }

    #[test]
    fn rows_at_decodes_every_chunk_in_order() {
        let store = MemStore::new();
        store.add(b"k", &encode_row(&rr(TYPE_A, false, vec![1, 2, 3, 4])).unwrap()).unwrap();
        store.add(b"k", &encode_row(&rr(TYPE_NS, false, vec![9])).unwrap()).unwrap();

        let rows = rows_at(&store, b"k").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rtype, TYPE_A);
        assert_eq!(rows[1].rtype, TYPE_NS);
    }

    #[test]
    fn rows_of_type_filters_by_type_and_wildcard_flag() {
        let store = MemStore::new();
        store.add(b"k", &encode_row(&rr(TYPE_A, false, vec![1, 1, 1, 1])).unwrap()).unwrap();
        store.add(b"k", &encode_row(&rr(TYPE_A, true, vec![2, 2, 2, 2])).unwrap()).unwrap();

        let rows = rows_at(&store, b"k").unwrap();
        let plain = rows_of_type(&rows, TYPE_A, false);
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].rdata, vec![1, 1, 1, 1]);
    }

    #[test]
    fn has_plain_row_detects_occupied_owner() {
        let store = MemStore::new();
        store.add(b"k", &encode_row(&rr(TYPE_NS, false, vec![1])).unwrap()).unwrap();
        let rows = rows_at(&store, b"k").unwrap();
        assert!(has_plain_row(&rows));
    }
}
