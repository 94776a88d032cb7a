//! Packed-name codec (component A): encode/decode DNS wire names and the
//! reversed-name keys the V2 storage schema sorts on.
use std::fmt;

use crate::error::{DnsDbError, DnsDbResult};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

/// A lower-case canonicalized, length-prefixed, zero-terminated wire name:
/// `3www6google2ie0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackedName(pub Vec<u8>);

/// The same bytes with labels written most-significant-label-first, so
/// byte-sorted order tracks DNS hierarchical order (ancestors sort before
/// descendants). Only ever produced by [`reverse`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReversedName(pub Vec<u8>);

/// Splits `name` (e.g. `"www.example.com"`) into lower-case labels and
/// packs them as length-prefixed octets terminated by a zero byte.
pub fn pack(name: &str) -> DnsDbResult<PackedName> {
    let trimmed = name.trim_end_matches('.');
    let mut out = Vec::with_capacity(trimmed.len() + 2);

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsDbError::NameTooLong);
            }
            out.push(label.len() as u8);
            out.extend(label.as_bytes().iter().map(|b| b.to_ascii_lowercase()));
        }
    }
    out.push(0);

    if out.len() > MAX_NAME_LEN {
        return Err(DnsDbError::NameTooLong);
    }

    Ok(PackedName(out))
}

/// Splits a packed name into its label byte-slices, in wire order,
/// excluding the terminating zero octet.
pub fn labels(packed: &[u8]) -> Vec<&[u8]> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < packed.len() {
        let len = packed[i] as usize;
        if len == 0 {
            break;
        }
        let start = i + 1;
        let end = (start + len).min(packed.len());
        out.push(&packed[start..end]);
        i = end;
    }
    out
}

/// Writes labels from last to first, preserving each label's length prefix
/// and the trailing zero octet.
pub fn reverse(packed: &PackedName) -> ReversedName {
    let ls = labels(&packed.0);
    let mut out = Vec::with_capacity(packed.0.len());
    for label in ls.iter().rev() {
        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }
    out.push(0);
    ReversedName(out)
}

/// Inverse of [`reverse`]: reversing a reversed name yields the original
/// packed name back.
pub fn unreverse(reversed: &ReversedName) -> PackedName {
    let ls = labels(&reversed.0);
    let mut out = Vec::with_capacity(reversed.0.len());
    for label in ls.iter().rev() {
        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }
    out.push(0);
    PackedName(out)
}

/// True iff every byte of `label` is in `[a-z0-9] ∪ {'-','_'}`. Ascent past
/// a label that fails this check is refused by the answer assembler: an
/// attacker-controlled label must never silently widen a wildcard match.
pub fn label_wildsafe(label: &[u8]) -> bool {
    label
        .iter()
        .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

/// Compares two reversed packed names label by label (not byte by byte),
/// advancing by whole labels only, and returns how many labels matched.
/// Tolerates a length byte claiming more bytes than remain in its input by
/// treating the truncated tail as a mismatch rather than panicking.
pub fn longest_common_label_prefix(a: &[u8], b: &[u8]) -> usize {
    let la = labels(a);
    let lb = labels(b);
    let mut count = 0usize;
    for (x, y) in la.iter().zip(lb.iter()) {
        if x == y {
            count += 1;
        } else {
            break;
        }
    }
    count
}

impl fmt::Display for PackedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ls = labels(&self.0);
        if ls.is_empty() {
            return write!(f, ".");
        }
        for (i, label) in ls.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl fmt::Display for ReversedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", unreverse(self))
    }
}

impl PackedName {
    /// Strips the leftmost label, returning the remaining packed name
    /// (used by the answer assembler's label-walk toward the zone cut).
    pub fn strip_leading_label(&self) -> Option<PackedName> {
        let ls = labels(&self.0);
        if ls.is_empty() {
            return None;
        }
        let mut out = Vec::new();
        for label in &ls[1..] {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        Some(PackedName(out))
    }

    pub fn label_count(&self) -> usize {
        labels(&self.0).len()
    }

    pub fn first_label(&self) -> Option<Vec<u8>> {
        labels(&self.0).first().map(|l| l.to_vec())
    }
}
