//! Additional-section filler (component J): resolves the glue addresses
//! for NS/MX/SRV targets that fall inside the responding zone, so a
//! resolver doesn't need a second round trip for the common case.
use rand::Rng;

use crate::answer::{self, AssembledAnswer};
use crate::error::DnsDbResult;
use crate::location::LocationId;
use crate::name::{self, PackedName};
use crate::record::{DecodedRow, TYPE_AAAA, TYPE_A, TYPE_MX, TYPE_NS, TYPE_SRV};
use crate::store::KvStore;

/// One resolved glue record offered in the additional section.
#[derive(Debug, Clone, PartialEq)]
pub struct Glue {
    pub owner: PackedName,
    pub row: DecodedRow,
}

/// True iff `name` is `zone` or a descendant of it — the bailiwick
/// check. A target outside the zone is never glued: the resolver must
/// ask that name's own authority instead.
pub fn in_bailiwick(name: &PackedName, zone: &PackedName) -> bool {
    let reversed_name = name::reverse(name);
    let reversed_zone = name::reverse(zone);
    let zone_labels = name::labels(&reversed_zone.0).len();
    name::longest_common_label_prefix(&reversed_name.0, &reversed_zone.0) == zone_labels
}

/// Extracts the target name embedded in an NS/MX/SRV row's RDATA, if
/// any. Other types carry no referenceable name and return `None`.
pub fn target_name(row: &DecodedRow) -> Option<PackedName> {
    let offset = match row.rtype {
        TYPE_NS => 0,
        TYPE_MX => 2,
        TYPE_SRV => 6,
        _ => return None,
    };
    row.rdata.get(offset..).map(|bytes| PackedName(bytes.to_vec()))
}

/// Resolves A/AAAA glue for every NS/MX/SRV row in `rows` whose target
/// falls inside `zone`, picking one weighted candidate per target/type
/// the same way the primary answer would.
pub fn fill<R: Rng + ?Sized>(
    store: &dyn KvStore,
    rng: &mut R,
    rows: &[DecodedRow],
    zone: &PackedName,
    loc: &LocationId,
) -> DnsDbResult<Vec<Glue>> {
    let mut glue = Vec::new();
    for row in rows {
        let Some(target) = target_name(row) else { continue };
        if !in_bailiwick(&target, zone) {
            continue;
        }
        for rtype in [TYPE_A, TYPE_AAAA] {
            if let Some(AssembledAnswer { owner, rows: addr_rows, .. }) = answer::assemble(store, rtype, &target, loc)? {
                let picked = answer::pick_weighted(rng, &addr_rows, 1);
                if let Some(row) = picked.chosen.into_iter().next() {
                    glue.push(Glue { owner: owner.clone(), row });
                }
            }
        }
    }
    Ok(glue)
}
