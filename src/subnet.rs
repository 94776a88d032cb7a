//! Subnet rearranger (component B): converts overlapping CIDR→location
//! assignments into a totally ordered, well-nested sequence of range
//! points keyed by (start-ip, mask-len).
use std::cmp::Ordering;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::DnsDbResult;
use crate::location::LocationId;

/// The synthetic boundary separating the IPv4-mapped region from native
/// IPv6. Matches `::ffff:0:0`.
pub const V4_REGION_START: Ipv6Addr = Ipv6Addr::new(0, 0, 0, 0, 0, 0xffff, 0, 0);
/// First address past the IPv4-mapped region. Matches `0:0:0:0:1::`.
pub const V4_REGION_END: Ipv6Addr = Ipv6Addr::new(0, 0, 0, 0, 1, 0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePoint {
    pub ip: Ipv6Addr,
    pub mask_len: u8,
    pub loc_id: LocationId,
    pub kind: PointKind,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub cidr: IpNet,
    /// Raw location bytes as they appear in source text: empty or exactly
    /// 2 bytes. Validated by [`rearrange`] before any point is emitted.
    pub loc: Vec<u8>,
}

/// A minimal CIDR representation; IPv4 is always widened to v4-in-v6.
#[derive(Debug, Clone, Copy)]
pub struct IpNet {
    pub network: Ipv6Addr,
    pub prefix_len: u8,
    pub is_v4: bool,
}

impl IpNet {
    pub fn v4(addr: Ipv4Addr, prefix_len: u8) -> Self {
        IpNet {
            network: widen_v4(addr),
            prefix_len: prefix_len + 96,
            is_v4: true,
        }
    }

    pub fn v6(addr: Ipv6Addr, prefix_len: u8) -> Self {
        IpNet {
            network: addr,
            prefix_len,
            is_v4: false,
        }
    }

    /// Cleans the network address by masking off any host bits, then
    /// returns the first address past the range (`None` if the range ends
    /// at the final representable address).
    fn bounds(&self) -> (Ipv6Addr, Option<Ipv6Addr>) {
        let masked = mask_addr(self.network, self.prefix_len);
        let last = last_addr(masked, self.prefix_len);
        let next = increment(last);
        (masked, next)
    }
}

pub fn widen_v4(addr: Ipv4Addr) -> Ipv6Addr {
    let octets = addr.octets();
    Ipv6Addr::new(
        0,
        0,
        0,
        0,
        0,
        0xffff,
        u16::from_be_bytes([octets[0], octets[1]]),
        u16::from_be_bytes([octets[2], octets[3]]),
    )
}

pub fn mask_addr(addr: Ipv6Addr, prefix_len: u8) -> Ipv6Addr {
    if prefix_len == 0 {
        return Ipv6Addr::UNSPECIFIED;
    }
    if prefix_len >= 128 {
        return addr;
    }
    let mask: u128 = !0u128 << (128 - prefix_len as u32);
    Ipv6Addr::from_bits(addr.to_bits() & mask)
}

fn last_addr(network: Ipv6Addr, prefix_len: u8) -> Ipv6Addr {
    if prefix_len == 0 {
        return Ipv6Addr::from_bits(!0u128);
    }
    if prefix_len >= 128 {
        return network;
    }
    let host_bits = 128 - prefix_len as u32;
    let mask: u128 = (1u128 << host_bits) - 1;
    Ipv6Addr::from_bits(network.to_bits() | mask)
}

fn increment(addr: Ipv6Addr) -> Option<Ipv6Addr> {
    let bits = addr.to_bits();
    bits.checked_add(1).map(Ipv6Addr::from_bits)
}

/// Converts a set of (CIDR, location) assignments under a single map into
/// a sorted, well-nested range-point stream. `has_default_v4`/`has_default_v6`
/// tell the rearranger whether the caller already supplied a `0.0.0.0/0`
/// or `::/0` assignment; if not, a null-location default is synthesized so
/// neither address family leaks into the other (spec §4.B steps 1–2).
pub fn rearrange(
    assignments: &[Assignment],
    has_default_v4: bool,
    has_default_v6: bool,
) -> DnsDbResult<Vec<RangePoint>> {
    // validate every input's location bytes before emitting any point for
    // any of them (spec §4.B failure semantics)
    let locations: Vec<LocationId> = assignments
        .iter()
        .map(|a| LocationId::from_raw(&a.loc))
        .collect::<DnsDbResult<_>>()?;

    let mut points = Vec::with_capacity(assignments.len() * 2 + 4);

    for (a, loc_id) in assignments.iter().zip(locations.into_iter()) {
        let (start, end) = a.cidr.bounds();
        points.push(RangePoint {
            ip: start,
            mask_len: a.cidr.prefix_len,
            loc_id,
            kind: PointKind::Start,
        });
        if let Some(end_ip) = end {
            points.push(RangePoint {
                ip: end_ip,
                mask_len: a.cidr.prefix_len,
                loc_id: LocationId::none(),
                kind: PointKind::End,
            });
        }
    }

    if !has_default_v4 {
        points.push(RangePoint {
            ip: V4_REGION_START,
            mask_len: 96,
            loc_id: LocationId::none(),
            kind: PointKind::Start,
        });
        points.push(RangePoint {
            ip: V4_REGION_END,
            mask_len: 96,
            loc_id: LocationId::none(),
            kind: PointKind::End,
        });
    }
    if !has_default_v6 {
        points.push(RangePoint {
            ip: Ipv6Addr::UNSPECIFIED,
            mask_len: 0,
            loc_id: LocationId::none(),
            kind: PointKind::Start,
        });
    }

    points.sort_by(compare_points);

    let mut stack: Vec<LocationId> = vec![LocationId::none()];
    for p in points.iter_mut() {
        match p.kind {
            PointKind::Start => stack.push(p.loc_id.clone()),
            PointKind::End => {
                stack.pop();
                p.loc_id = stack.last().cloned().unwrap_or_else(LocationId::none);
            }
        }
    }

    Ok(squash(points))
}

/// `(ip ascending, End before Start, shorter-prefix-first on Start/Start,
/// longer-prefix-first on End/End)`.
fn compare_points(a: &RangePoint, b: &RangePoint) -> Ordering {
    a.ip.cmp(&b.ip).then_with(|| match (a.kind, b.kind) {
        (PointKind::End, PointKind::Start) => Ordering::Less,
        (PointKind::Start, PointKind::End) => Ordering::Greater,
        (PointKind::Start, PointKind::Start) => a.mask_len.cmp(&b.mask_len),
        (PointKind::End, PointKind::End) => b.mask_len.cmp(&a.mask_len),
    })
}

/// Squashes consecutive points sharing the same IP when the later, less
/// specific point (mask length ≤ the earlier's) would otherwise shadow it;
/// never squashes across different IPs.
fn squash(points: Vec<RangePoint>) -> Vec<RangePoint> {
    let mut out: Vec<RangePoint> = Vec::with_capacity(points.len());
    for p in points {
        if let Some(last) = out.last() {
            if last.ip == p.ip && p.mask_len <= last.mask_len {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

/// Widens a client address (v4 or v6) to the v6 probe space, adding 96 to
/// an IPv4 source netmask as §4.F requires.
pub fn widen_query_ip(ip: IpAddr, mask_len: u8) -> (Ipv6Addr, u8) {
    match ip {
        IpAddr::V4(v4) => (widen_v4(v4), mask_len + 96),
        IpAddr::V6(v6) => (v6, mask_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8, loc: u16) -> Assignment {
        Assignment {
            cidr: IpNet::v4(Ipv4Addr::new(a, b, c, d), prefix),
            loc: loc.to_be_bytes().to_vec(),
        }
    }

    #[test]
    fn non_overlapping_ranges_stay_separate() {
        let assignments = vec![v4(10, 0, 0, 0, 24, 1), v4(10, 0, 1, 0, 24, 2)];
        let points = rearrange(&assignments, false, false).unwrap();
        // each assignment contributes a start+end, plus the v4/v6 default
        // synthetic boundaries
        assert!(points.len() >= 4);
        assert!(points.windows(2).all(|w| compare_points(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn end_point_inherits_enclosing_location() {
        // an inner /25 carved out of an outer /24: after the inner range
        // ends, the enclosing /24's location must be restored.
        let outer = Assignment {
            cidr: IpNet::v4(Ipv4Addr::new(10, 0, 0, 0), 24),
            loc: 1u16.to_be_bytes().to_vec(),
        };
        let inner = Assignment {
            cidr: IpNet::v4(Ipv4Addr::new(10, 0, 0, 0), 25),
            loc: 2u16.to_be_bytes().to_vec(),
        };
        let points = rearrange(&[outer, inner], false, false).unwrap();
        let inner_end = points
            .iter()
            .find(|p| p.kind == PointKind::End && p.mask_len == 25)
            .expect("inner end point present");
        assert_eq!(inner_end.loc_id, LocationId::short(1));
    }

    #[test]
    fn trailing_128_omits_end_point() {
        let assignment = Assignment {
            cidr: IpNet::v6(Ipv6Addr::new(0xff, 0, 0, 0, 0, 0, 0, 1), 128),
            loc: 9u16.to_be_bytes().to_vec(),
        };
        let points = rearrange(&[assignment], true, true).unwrap();
        // last addr has no successor so checked_add saturates to None and
        // no End point is ever pushed for it
        assert_eq!(points.iter().filter(|p| p.kind == PointKind::Start).count(), 1);
        assert_eq!(points.iter().filter(|p| p.kind == PointKind::End).count(), 0);
    }

    #[test]
    fn invalid_location_bytes_fail_before_any_point_emitted() {
        let bad = Assignment {
            cidr: IpNet::v4(Ipv4Addr::new(1, 2, 3, 0), 24),
            loc: vec![1, 2, 3],
        };
        assert!(rearrange(&[bad], false, false).is_err());
    }

    #[test]
    fn slash_zero_masks_to_unspecified_and_spans_the_whole_space() {
        let host = Ipv6Addr::new(0xff, 0, 0, 0, 0, 0, 0, 1);
        assert_eq!(mask_addr(host, 0), Ipv6Addr::UNSPECIFIED);
        assert_eq!(last_addr(Ipv6Addr::UNSPECIFIED, 0), Ipv6Addr::from_bits(!0u128));
    }

    #[test]
    fn default_v4_and_v6_ranges_rearrange_without_panicking() {
        let v4_default = Assignment {
            cidr: IpNet::v4(Ipv4Addr::new(0, 0, 0, 0), 0),
            loc: 1u16.to_be_bytes().to_vec(),
        };
        let v6_default = Assignment {
            cidr: IpNet::v6(Ipv6Addr::UNSPECIFIED, 0),
            loc: 2u16.to_be_bytes().to_vec(),
        };
        let points = rearrange(&[v4_default, v6_default], true, true).unwrap();
        // a real `/0` start point for each family, each immediately
        // carrying its assigned location rather than an empty default
        let v4_start = points.iter().find(|p| p.ip == V4_REGION_START).expect("v4 /0 start present");
        assert_eq!(v4_start.loc_id, LocationId::short(1));
        let v6_start = points.iter().find(|p| p.ip == Ipv6Addr::UNSPECIFIED).expect("v6 /0 start present");
        assert_eq!(v6_start.loc_id, LocationId::short(2));
    }

    #[test]
    fn widen_query_ip_adds_96_for_v4() {
        let (ip, mask) = widen_query_ip(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 0)), 24);
        assert_eq!(mask, 120);
        assert_eq!(ip, widen_v4(Ipv4Addr::new(8, 8, 8, 0)));
    }
}
