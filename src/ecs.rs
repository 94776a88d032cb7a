//! EDNS Client Subnet option parsing (RFC 7871), feeding the location
//! lookup (component F) the client's network instead of the resolver's.
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{DnsDbError, DnsDbResult};

pub const OPTION_CODE: u16 = 8;
const FAMILY_IPV4: u16 = 1;
const FAMILY_IPV6: u16 = 2;

/// A decoded `ECS` option: the client subnet and how specific it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSubnet {
    pub address: IpAddr,
    pub source_prefix_len: u8,
    pub scope_prefix_len: u8,
}

/// Parses OPTION-DATA for an ECS option (the bytes after the OPTION-CODE
/// and OPTION-LENGTH fields, not including them).
pub fn parse(data: &[u8]) -> DnsDbResult<ClientSubnet> {
    if data.len() < 4 {
        return Err(DnsDbError::UnexpectedEof);
    }
    let family = u16::from_be_bytes([data[0], data[1]]);
    let source_prefix_len = data[2];
    let scope_prefix_len = data[3];
    let addr_bytes = &data[4..];

    let address = match family {
        FAMILY_IPV4 => {
            let needed = source_prefix_len.div_ceil(8) as usize;
            if addr_bytes.len() < needed || needed > 4 {
                return Err(DnsDbError::UnexpectedEof);
            }
            let mut octets = [0u8; 4];
            octets[..needed].copy_from_slice(&addr_bytes[..needed]);
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        FAMILY_IPV6 => {
            let needed = source_prefix_len.div_ceil(8) as usize;
            if addr_bytes.len() < needed || needed > 16 {
                return Err(DnsDbError::UnexpectedEof);
            }
            let mut octets = [0u8; 16];
            octets[..needed].copy_from_slice(&addr_bytes[..needed]);
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        other => return Err(DnsDbError::ParseError(format!("unknown ECS family {other}"))),
    };

    Ok(ClientSubnet {
        address,
        source_prefix_len,
        scope_prefix_len,
    })
}

/// Encodes a scope-prefix-annotated echo of the option, as the answer
/// path sends back in its response ECS to tell the resolver how broadly
/// it may cache this answer.
pub fn encode_scope_response(subnet: &ClientSubnet, scope_prefix_len: u8) -> Vec<u8> {
    let (family, addr_bytes): (u16, Vec<u8>) = match subnet.address {
        IpAddr::V4(v4) => (FAMILY_IPV4, v4.octets().to_vec()),
        IpAddr::V6(v6) => (FAMILY_IPV6, v6.octets().to_vec()),
    };
    let needed = subnet.source_prefix_len.div_ceil(8) as usize;
    let mut out = Vec::with_capacity(4 + needed);
    out.extend(family.to_be_bytes());
    out.push(subnet.source_prefix_len);
    out.push(scope_prefix_len);
    out.extend(&addr_bytes[..needed.min(addr_bytes.len())]);
    out
}
