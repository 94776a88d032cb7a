//! Answer assembler (component H): walks from the query name toward the
//! root through an `Exact → Wildcard → Exact-at-parent → …` cycle,
//! returning the first owner with matching rows, and — for A/AAAA —
//! reduces multiple weighted candidates to one via [`crate::wrs`].
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::DnsDbResult;
use crate::keys;
use crate::location::LocationId;
use crate::name::{self, PackedName};
use crate::record::{DecodedRow, TYPE_A, TYPE_AAAA};
use crate::record_iter::{self, rows_of_type};
use crate::store::KvStore;
use crate::wrs::{self, Candidate};

/// The owner name and rows an assembly pass actually landed on, which
/// may differ from the query name when a wildcard or an ancestor
/// answered instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledAnswer {
    pub owner: PackedName,
    pub rows: Vec<DecodedRow>,
    pub matched_wildcard: bool,
}

/// Up to `N` A/AAAA rows selected by weighted reservoir sampling, plus
/// any non-address rows matched alongside them (a CNAME unioned in by
/// [`record_iter::rows_of_type`], or every row when the query type is
/// `ANY`) passed straight through untouched. `offered_count` is the
/// total number of address candidates that were offered to the sampler,
/// regardless of how many were kept — weight describes relative
/// offering likelihood, not a guarantee the client observes that
/// fraction in any one answer. `weighted` is true iff more than one
/// address candidate was ever seen, independent of `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAnswer {
    pub chosen: Vec<DecodedRow>,
    pub offered_count: usize,
    pub weighted: bool,
}

fn loc_key_bytes(loc: &LocationId) -> [u8; 2] {
    match loc {
        LocationId::None => [0, 0],
        LocationId::Short(b) => *b,
        // long-form location IDs are not addressable in an RR row key;
        // callers that resolve to one fall back to the unlocated rows.
        LocationId::Long(_) => [0, 0],
    }
}

fn lookup_rows(
    store: &dyn KvStore,
    name: &PackedName,
    loc: &LocationId,
    rtype: u16,
    wildcard: bool,
) -> DnsDbResult<Option<Vec<DecodedRow>>> {
    let reversed = name::reverse(name);
    let loc_bytes = loc_key_bytes(loc);

    if loc_bytes != [0, 0] {
        let key = keys::rr_key_v2(&reversed, loc_bytes);
        let rows = record_iter::rows_at(store, &key)?;
        let matched = rows_of_type(&rows, rtype, wildcard);
        if !matched.is_empty() {
            return Ok(Some(matched));
        }
    }

    let key = keys::rr_key_v2(&reversed, [0, 0]);
    let rows = record_iter::rows_at(store, &key)?;
    let matched = rows_of_type(&rows, rtype, wildcard);
    Ok(if matched.is_empty() { None } else { Some(matched) })
}

/// Whether `name` is occupied by any plain (non-wildcard) row of any
/// type. Distinguishes NODATA (occupied, wrong type) from NXDOMAIN
/// (nothing here at all) once [`assemble`] returns `None`.
pub fn has_any_plain_row(store: &dyn KvStore, name: &PackedName, loc: &LocationId) -> DnsDbResult<bool> {
    let reversed = name::reverse(name);
    for lb in [loc_key_bytes(loc), [0, 0]] {
        let key = keys::rr_key_v2(&reversed, lb);
        let rows = record_iter::rows_at(store, &key)?;
        if record_iter::has_plain_row(&rows) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Runs the label-walk for one (qname, rtype, location) triple. Returns
/// `None` when an occupied node blocks further ascent without matching
/// (NODATA/NXRRSET territory — the authority resolver decides which).
pub fn assemble(store: &dyn KvStore, rtype: u16, qname: &PackedName, loc: &LocationId) -> DnsDbResult<Option<AssembledAnswer>> {
    let mut cur = qname.clone();
    let original = qname.clone();

    loop {
        if let Some(rows) = lookup_rows(store, &cur, loc, rtype, false)? {
            return Ok(Some(AssembledAnswer {
                owner: cur,
                rows,
                matched_wildcard: false,
            }));
        }

        if cur != original && has_any_plain_row(store, &cur, loc)? {
            // an occupied ancestor node terminates the walk: it is a real
            // delegation/zone-cut point, not an empty non-terminal.
            return Ok(None);
        }

        let Some(parent) = cur.strip_leading_label() else {
            return Ok(None);
        };

        let consumed_label_is_wildsafe = cur.first_label().is_some_and(|l| name::label_wildsafe(&l));
        if consumed_label_is_wildsafe {
            if let Some(rows) = lookup_rows(store, &parent, loc, rtype, true)? {
                return Ok(Some(AssembledAnswer {
                    owner: original,
                    rows,
                    matched_wildcard: true,
                }));
            }
        }

        if parent.label_count() == 0 {
            return Ok(None);
        }
        cur = parent;
    }
}

/// Reduces a matched row set to an emittable set of size at most `n` per
/// address family via weighted reservoir sampling, passing through any
/// row that isn't itself an A/AAAA candidate (a unioned CNAME, or any
/// other type an `ANY` query pulled in) unconditionally. A/AAAA rows are
/// grouped by their own type so an `ANY` query that matched both
/// families gets up to `n` of each, not one pool of `2n`.
pub fn pick_weighted<R: Rng + ?Sized>(rng: &mut R, rows: &[DecodedRow], n: usize) -> WeightedAnswer {
    let mut passthrough = Vec::new();
    let mut a_candidates = Vec::new();
    let mut aaaa_candidates = Vec::new();

    for (index, r) in rows.iter().enumerate() {
        let weight = r.weight.unwrap_or(1);
        match r.rtype {
            TYPE_A => a_candidates.push(Candidate { index, weight }),
            TYPE_AAAA => aaaa_candidates.push(Candidate { index, weight }),
            _ => passthrough.push(r.clone()),
        }
    }

    let offered_count = a_candidates.len() + aaaa_candidates.len();
    let weighted = offered_count > 1;

    let mut address_winners: Vec<DecodedRow> = Vec::new();
    for candidates in [&a_candidates, &aaaa_candidates] {
        for winner in wrs::select_n(rng, candidates, n) {
            address_winners.push(rows[winner.index].clone());
        }
    }
    address_winners.shuffle(rng);

    let mut chosen = passthrough;
    chosen.extend(address_winners);

    WeightedAnswer {
        chosen,
        offered_count,
        weighted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{encode_row, PrimitiveRr, TYPE_CNAME};
    use crate::rng::seeded;
    use crate::store::MemStore;

    fn put_row(store: &MemStore, owner: &str, loc: [u8; 2], rr: &PrimitiveRr) {
        let reversed = name::reverse(&name::pack(owner).unwrap());
        let key = keys::rr_key_v2(&reversed, loc);
        store.add(&key, &encode_row(rr).unwrap()).unwrap();
    }

    #[test]
    fn exact_match_wins_over_wildcard() {
        let store = MemStore::new();
        put_row(
            &store,
            "www.example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "www.example.com".into(),
                rtype: TYPE_CNAME,
                is_wildcard: false,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"target".to_vec(),
            },
        );
        let qname = name::pack("www.example.com").unwrap();
        let found = assemble(&store, TYPE_CNAME, &qname, &LocationId::None).unwrap().unwrap();
        assert!(!found.matched_wildcard);
        assert_eq!(found.owner, qname);
    }

    #[test]
    fn wildcard_answers_unmatched_descendant() {
        let store = MemStore::new();
        put_row(
            &store,
            "example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "example.com".into(),
                rtype: TYPE_CNAME,
                is_wildcard: true,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"target".to_vec(),
            },
        );
        let qname = name::pack("anything.example.com").unwrap();
        let found = assemble(&store, TYPE_CNAME, &qname, &LocationId::None).unwrap().unwrap();
        assert!(found.matched_wildcard);
        assert_eq!(found.owner, qname);
    }

    #[test]
    fn occupied_node_blocks_wildcard_for_its_own_descendants_lookup() {
        let store = MemStore::new();
        // "sub.example.com" exists (as an NS row, different type), so a
        // wildcard at "example.com" must not answer for its children.
        put_row(
            &store,
            "sub.example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "sub.example.com".into(),
                rtype: crate::record::TYPE_NS,
                is_wildcard: false,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"ns".to_vec(),
            },
        );
        put_row(
            &store,
            "example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "example.com".into(),
                rtype: TYPE_CNAME,
                is_wildcard: true,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"target".to_vec(),
            },
        );
        let qname = name::pack("deeper.sub.example.com").unwrap();
        let found = assemble(&store, TYPE_CNAME, &qname, &LocationId::None).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn wildcard_never_absorbs_a_wildcard_unsafe_label() {
        let store = MemStore::new();
        put_row(
            &store,
            "example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "example.com".into(),
                rtype: TYPE_A,
                is_wildcard: true,
                loc: Vec::new(),
                ttl: 60,
                weight: Some(1),
                rdata: vec![1, 2, 3, 4],
            },
        );
        let qname = name::pack("a/b.example.com").unwrap();
        assert!(assemble(&store, TYPE_A, &qname, &LocationId::None).unwrap().is_none());
    }

    #[test]
    fn pick_weighted_reports_offered_count_not_emitted_fraction() {
        let rows = vec![
            crate::record::decode_row(
                &encode_row(&PrimitiveRr {
                    owner: "a".into(),
                    rtype: TYPE_A,
                    is_wildcard: false,
                    loc: Vec::new(),
                    ttl: 60,
                    weight: Some(1),
                    rdata: vec![1, 1, 1, 1],
                })
                .unwrap(),
            )
            .unwrap(),
            crate::record::decode_row(
                &encode_row(&PrimitiveRr {
                    owner: "a".into(),
                    rtype: TYPE_A,
                    is_wildcard: false,
                    loc: Vec::new(),
                    ttl: 60,
                    weight: Some(1),
                    rdata: vec![2, 2, 2, 2],
                })
                .unwrap(),
            )
            .unwrap(),
        ];
        let mut rng = seeded(3);
        let picked = pick_weighted(&mut rng, &rows, 1);
        assert_eq!(picked.offered_count, 2);
        assert!(picked.weighted);
        assert_eq!(picked.chosen.len(), 1);
    }

    #[test]
    fn pick_weighted_keeps_up_to_n_distinct_address_rows() {
        let rows: Vec<DecodedRow> = (0..6u8)
            .map(|i| {
                crate::record::decode_row(
                    &encode_row(&PrimitiveRr {
                        owner: "a".into(),
                        rtype: TYPE_A,
                        is_wildcard: false,
                        loc: Vec::new(),
                        ttl: 60,
                        weight: Some(1),
                        rdata: vec![1, 1, 1, i],
                    })
                    .unwrap(),
                )
                .unwrap()
            })
            .collect();
        let mut rng = seeded(9);
        let picked = pick_weighted(&mut rng, &rows, 3);
        assert_eq!(picked.chosen.len(), 3);
        assert_eq!(picked.offered_count, 6);
        let distinct: std::collections::BTreeSet<Vec<u8>> = picked.chosen.iter().map(|r| r.rdata.clone()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn cname_row_passes_through_unreduced_alongside_an_a_query() {
        let store = MemStore::new();
        put_row(
            &store,
            "alias.example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "alias.example.com".into(),
                rtype: TYPE_CNAME,
                is_wildcard: false,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"target.example.com".to_vec(),
            },
        );
        let qname = name::pack("alias.example.com").unwrap();
        let found = assemble(&store, TYPE_A, &qname, &LocationId::None).unwrap().unwrap();
        assert_eq!(found.rows.len(), 1);
        assert_eq!(found.rows[0].rtype, TYPE_CNAME);

        let mut rng = seeded(1);
        let picked = pick_weighted(&mut rng, &found.rows, 1);
        assert_eq!(picked.chosen.len(), 1);
        assert_eq!(picked.chosen[0].rtype, TYPE_CNAME);
        assert_eq!(picked.offered_count, 0);
        assert!(!picked.weighted);
    }

    #[test]
    fn any_query_matches_rows_of_every_type_at_the_owner() {
        let store = MemStore::new();
        put_row(
            &store,
            "multi.example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "multi.example.com".into(),
                rtype: TYPE_A,
                is_wildcard: false,
                loc: Vec::new(),
                ttl: 60,
                weight: Some(1),
                rdata: vec![1, 2, 3, 4],
            },
        );
        put_row(
            &store,
            "multi.example.com",
            [0, 0],
            &PrimitiveRr {
                owner: "multi.example.com".into(),
                rtype: crate::record::TYPE_TXT,
                is_wildcard: false,
                loc: Vec::new(),
                ttl: 60,
                weight: None,
                rdata: b"hello".to_vec(),
            },
        );
        let qname = name::pack("multi.example.com").unwrap();
        let found = assemble(&store, crate::record::TYPE_ANY, &qname, &LocationId::None).unwrap().unwrap();
        assert_eq!(found.rows.len(), 2);
        assert!(found.rows.iter().any(|r| r.rtype == TYPE_A));
        assert!(found.rows.iter().any(|r| r.rtype == crate::record::TYPE_TXT));
    }
}
