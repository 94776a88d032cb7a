//! Record codec (component C): parses the line-oriented zone source
//! format into a tagged union of primitive records, expands composite
//! sigils into their derived primitives, and marshals each primitive both
//! to its on-disk (key, value) form and back to round-trippable text.
use crate::error::{DnsDbError, DnsDbResult};
use crate::keys::{self, SchemaVersion};
use crate::location::{LocationId, MapClass};
use crate::name;

pub const TYPE_A: u16 = 1;
pub const TYPE_NS: u16 = 2;
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_SOA: u16 = 6;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_MX: u16 = 15;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_SRV: u16 = 33;
pub const TYPE_SVCB: u16 = 64;
pub const TYPE_HTTPS: u16 = 65;
pub const TYPE_ANY: u16 = 255;

pub const FLAG_PLAIN: u8 = b'=';
pub const FLAG_PLAIN_LOCATED: u8 = b'=' + 1;
pub const FLAG_WILDCARD: u8 = b'*';
pub const FLAG_WILDCARD_LOCATED: u8 = b'*' + 1;

pub const DEFAULT_TTL: u32 = 86400;
pub const SOA_DEFAULT_TTL: u32 = 2560;
pub const TXT_SEGMENT_LEN: usize = 127;

/// Governs how a parsed line is turned into key/value pairs: which key
/// schema is active, and the default SOA serial when the source line
/// omits one (spec §4.K "Derived inputs").
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub schema: SchemaVersion,
    pub default_serial: u32,
}

/// One fully decoded line of the source format (spec §4.C sigil table).
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Comment,
    Net {
        cidr_text: String,
        loc: Vec<u8>,
    },
    Soa(SoaFields),
    Apex {
        owner: String,
        ns: String,
        mbox: String,
        serial: Option<u32>,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
        addr: Option<String>,
    },
    NsGlue {
        owner: String,
        loc: Vec<u8>,
        ns: String,
        ttl: u32,
        glue: Option<String>,
    },
    Addr {
        owner: String,
        addr: String,
        ttl: u32,
        weight: u32,
        loc: Vec<u8>,
    },
    AddrPtr {
        owner: String,
        addr: String,
        ttl: u32,
        loc: Vec<u8>,
    },
    Mx {
        owner: String,
        distance: u16,
        target: String,
        ttl: u32,
        loc: Vec<u8>,
        addr: Option<String>,
    },
    Srv {
        owner: String,
        priority: u16,
        weight: u16,
        port: u16,
        target: String,
        ttl: u32,
        loc: Vec<u8>,
        addr: Option<String>,
    },
    Cname {
        owner: String,
        target: String,
        ttl: u32,
        loc: Vec<u8>,
    },
    Ptr {
        owner: String,
        target: String,
        ttl: u32,
        loc: Vec<u8>,
    },
    Txt {
        owner: String,
        text: Vec<u8>,
        ttl: u32,
        loc: Vec<u8>,
    },
    Generic {
        owner: String,
        rtype: u16,
        rdata: Vec<u8>,
        ttl: u32,
        loc: Vec<u8>,
    },
    MapBinding {
        class: MapClass,
        owner: String,
        map_id: [u8; 2],
    },
    RangePoint {
        raw: Vec<u8>,
    },
    Svcb {
        owner: String,
        kind: SvcbKind,
        priority: u16,
        target: String,
        params: Vec<(u16, Vec<u8>)>,
        ttl: u32,
        loc: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcbKind {
    Svcb,
    Https,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoaFields {
    pub owner: String,
    pub ns: String,
    pub mbox: String,
    pub serial: Option<u32>,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub ttl: u32,
    pub minimum: u32,
}

/// A fully resolved primitive RR row, ready to be written to storage:
/// exactly one typed RR with no composite expansion left to do.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveRr {
    pub owner: String,
    pub rtype: u16,
    pub is_wildcard: bool,
    pub loc: Vec<u8>,
    pub ttl: u32,
    pub weight: Option<u32>,
    pub rdata: Vec<u8>,
}

/// Backslash-octal quoting: `\NNN` decodes to one binary byte; any other
/// byte passes through unchanged.
pub fn unquote(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() && bytes[i + 1..i + 4].iter().all(|b| b.is_ascii_digit()) {
            let octal = std::str::from_utf8(&bytes[i + 1..i + 4]).unwrap();
            if let Ok(value) = u8::from_str_radix(octal, 8) {
                out.push(value);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Re-encodes raw bytes using `\NNN` octal escapes for any byte outside
/// printable ASCII, so the result round-trips through [`unquote`].
pub fn quote(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() && b != b'\\' && b != b',' && b != b':' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:03o}", b));
        }
    }
    out
}

/// Splits a line's fields on whichever of `:`/`,` occurs first (ties go to
/// `,`), padding the result to at least 15 fields with empty strings.
pub fn split_fields(body: &str) -> Vec<String> {
    let sep = match (body.find(':'), body.find(',')) {
        (Some(ci), Some(gi)) if ci < gi => ':',
        (Some(_), None) => ':',
        _ => ',',
    };
    let mut fields: Vec<String> = body.split(sep).map(|s| s.to_string()).collect();
    while fields.len() < 15 {
        fields.push(String::new());
    }
    fields
}

fn parse_u32(field: &str, default: u32) -> u32 {
    if field.is_empty() {
        default
    } else {
        field.parse().unwrap_or(default)
    }
}

fn parse_u16(field: &str, default: u16) -> u16 {
    if field.is_empty() {
        default
    } else {
        field.parse().unwrap_or(default)
    }
}

fn strip_wildcard(owner: &str) -> (String, bool) {
    if let Some(rest) = owner.strip_prefix("*.") {
        (rest.to_string(), true)
    } else {
        (owner.to_string(), false)
    }
}

/// Parses one source line, routing on its first-byte sigil (spec §4.C
/// table). Blank lines are not valid input; callers filter them before
/// calling this.
pub fn parse_line(line: &str, _ctx: &ParseContext) -> DnsDbResult<Record> {
    let mut chars = line.chars();
    let sigil = chars.next().ok_or_else(|| DnsDbError::ParseError(line.to_string()))?;
    let body = chars.as_str();
    let f = split_fields(body);

    Ok(match sigil {
        '#' => Record::Comment,
        '%' => Record::Net {
            cidr_text: f[0].clone(),
            loc: unquote(&f[1]),
        },
        'Z' => Record::Soa(SoaFields {
            owner: f[0].clone(),
            ns: f[1].clone(),
            mbox: f[2].clone(),
            serial: f[3].parse().ok(),
            refresh: parse_u32(&f[4], 7200),
            retry: parse_u32(&f[5], 1800),
            expire: parse_u32(&f[6], 604800),
            ttl: parse_u32(&f[7], SOA_DEFAULT_TTL),
            minimum: parse_u32(&f[8], 300),
        }),
        '.' => Record::Apex {
            owner: f[0].clone(),
            ns: f[1].clone(),
            mbox: f[2].clone(),
            serial: f[3].parse().ok(),
            refresh: parse_u32(&f[4], 7200),
            retry: parse_u32(&f[5], 1800),
            expire: parse_u32(&f[6], 604800),
            minimum: parse_u32(&f[7], 300),
            addr: if f[8].is_empty() { None } else { Some(f[8].clone()) },
        },
        '&' => Record::NsGlue {
            owner: f[0].clone(),
            loc: unquote(&f[1]),
            ns: f[2].clone(),
            ttl: parse_u32(&f[3], DEFAULT_TTL),
            glue: None,
        },
        '+' => Record::Addr {
            owner: f[0].clone(),
            addr: f[1].clone(),
            ttl: parse_u32(&f[2], DEFAULT_TTL),
            weight: if f[3].is_empty() { 1 } else { f[3].parse().unwrap_or(1) },
            loc: unquote(&f[4]),
        },
        '=' => Record::AddrPtr {
            owner: f[0].clone(),
            addr: f[1].clone(),
            ttl: parse_u32(&f[2], DEFAULT_TTL),
            loc: unquote(&f[3]),
        },
        '@' => Record::Mx {
            owner: f[0].clone(),
            distance: parse_u16(&f[1], 0),
            target: f[2].clone(),
            ttl: parse_u32(&f[3], DEFAULT_TTL),
            loc: unquote(&f[4]),
            addr: if f[5].is_empty() { None } else { Some(f[5].clone()) },
        },
        'S' => Record::Srv {
            owner: f[0].clone(),
            priority: parse_u16(&f[1], 0),
            weight: parse_u16(&f[2], 0),
            port: parse_u16(&f[3], 0),
            target: f[4].clone(),
            ttl: parse_u32(&f[5], DEFAULT_TTL),
            loc: unquote(&f[6]),
            addr: if f[7].is_empty() { None } else { Some(f[7].clone()) },
        },
        'C' => Record::Cname {
            owner: f[0].clone(),
            target: f[1].clone(),
            ttl: parse_u32(&f[2], DEFAULT_TTL),
            loc: unquote(&f[3]),
        },
        '^' => Record::Ptr {
            owner: f[0].clone(),
            target: f[1].clone(),
            ttl: parse_u32(&f[2], DEFAULT_TTL),
            loc: unquote(&f[3]),
        },
        '\'' => Record::Txt {
            owner: f[0].clone(),
            text: unquote(&f[1]),
            ttl: parse_u32(&f[2], DEFAULT_TTL),
            loc: unquote(&f[3]),
        },
        ':' => Record::Generic {
            owner: f[0].clone(),
            rtype: f[1].parse().map_err(|_| DnsDbError::ParseError(line.to_string()))?,
            rdata: unquote(&f[2]),
            ttl: parse_u32(&f[3], DEFAULT_TTL),
            loc: unquote(&f[4]),
        },
        'M' => Record::MapBinding {
            class: MapClass::Resolver,
            owner: f[0].clone(),
            map_id: parse_map_id(&f[1])?,
        },
        '8' => Record::MapBinding {
            class: MapClass::Ecs,
            owner: f[0].clone(),
            map_id: parse_map_id(&f[1])?,
        },
        '!' => Record::RangePoint { raw: unquote(&f[0]) },
        'B' => parse_svcb(SvcbKind::Svcb, &f),
        'H' => parse_svcb(SvcbKind::Https, &f),
        other => return Err(DnsDbError::BadRecordType(other)),
    })
}

fn parse_map_id(field: &str) -> DnsDbResult<[u8; 2]> {
    let bytes = unquote(field);
    if bytes.len() != 2 {
        return Err(DnsDbError::InvalidLocation(bytes.len()));
    }
    Ok([bytes[0], bytes[1]])
}

fn parse_svcb(kind: SvcbKind, f: &[String]) -> Record {
    let mut params = Vec::new();
    if !f[4].is_empty() {
        for kv in f[4].split(';') {
            if let Some((k, v)) = kv.split_once('=') {
                if let Ok(key) = k.parse::<u16>() {
                    params.push((key, unquote(v)));
                }
            }
        }
        params.sort_by_key(|(k, _)| *k);
    }
    Record::Svcb {
        owner: f[0].clone(),
        kind,
        priority: parse_u16(&f[1], 0),
        target: f[2].clone(),
        params,
        ttl: parse_u32(&f[3], DEFAULT_TTL),
        loc: unquote(&f[5]),
    }
}

impl Record {
    /// Expands a composite sigil (`.`, `&`, `@`, `S`, `=`) into the `Vec`
    /// of primitive records it stands for; a record that is already
    /// primitive expands to a single-element `Vec`.
    pub fn derived_records(&self) -> Vec<PrimitiveRr> {
        match self {
            Record::Comment | Record::Net { .. } | Record::MapBinding { .. } | Record::RangePoint { .. } => {
                Vec::new()
            }
            Record::Soa(s) => vec![soa_row(s)],
            Record::Apex {
                owner,
                ns,
                mbox,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                addr,
            } => {
                let mut out = vec![
                    soa_row(&SoaFields {
                        owner: owner.clone(),
                        ns: ns.clone(),
                        mbox: mbox.clone(),
                        serial: *serial,
                        refresh: *refresh,
                        retry: *retry,
                        expire: *expire,
                        ttl: SOA_DEFAULT_TTL,
                        minimum: *minimum,
                    }),
                    ns_row(owner, &Vec::new(), ns, DEFAULT_TTL),
                ];
                if let Some(a) = addr {
                    out.push(addr_row(owner, &Vec::new(), a, DEFAULT_TTL, 1));
                }
                out
            }
            Record::NsGlue { owner, loc, ns, ttl, glue } => {
                let mut out = vec![ns_row(owner, loc, ns, *ttl)];
                if let Some(g) = glue {
                    out.push(addr_row(ns, loc, g, *ttl, 1));
                }
                out
            }
            Record::Addr { owner, addr, ttl, weight, loc } => {
                vec![addr_row(owner, loc, addr, *ttl, *weight)]
            }
            Record::AddrPtr { owner, addr, ttl, loc } => {
                let mut out = vec![addr_row(owner, loc, addr, *ttl, 1)];
                let (base_owner, is_wild) = strip_wildcard(owner);
                let ptr_name = reverse_dns_name(addr);
                let mut ptr_target = base_owner;
                if is_wild {
                    // preserve the upstream `*.` prefix bug when the
                    // address record is itself a wildcard (SPEC_FULL open
                    // question #3): it is documented, not silently fixed.
                    ptr_target = format!("*.{}", ptr_target);
                }
                out.push(PrimitiveRr {
                    owner: ptr_name,
                    rtype: TYPE_PTR,
                    is_wildcard: false,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata: name::pack(&ptr_target).map(|p| p.0).unwrap_or_default(),
                });
                out
            }
            Record::Mx { owner, distance, target, ttl, loc, addr } => {
                let mut rdata = distance.to_be_bytes().to_vec();
                rdata.extend(name::pack(target).map(|p| p.0).unwrap_or_default());
                let (base, is_wild) = strip_wildcard(owner);
                let mut out = vec![PrimitiveRr {
                    owner: base,
                    rtype: TYPE_MX,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata,
                }];
                if let Some(a) = addr {
                    out.push(addr_row(target, loc, a, *ttl, 1));
                }
                out
            }
            Record::Srv {
                owner,
                priority,
                weight,
                port,
                target,
                ttl,
                loc,
                addr,
            } => {
                let mut rdata = priority.to_be_bytes().to_vec();
                rdata.extend(weight.to_be_bytes());
                rdata.extend(port.to_be_bytes());
                rdata.extend(name::pack(target).map(|p| p.0).unwrap_or_default());
                let (base, is_wild) = strip_wildcard(owner);
                let mut out = vec![PrimitiveRr {
                    owner: base,
                    rtype: TYPE_SRV,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata,
                }];
                if let Some(a) = addr {
                    out.push(addr_row(target, loc, a, *ttl, 1));
                }
                out
            }
            Record::Cname { owner, target, ttl, loc } => {
                let (base, is_wild) = strip_wildcard(owner);
                vec![PrimitiveRr {
                    owner: base,
                    rtype: TYPE_CNAME,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata: name::pack(target).map(|p| p.0).unwrap_or_default(),
                }]
            }
            Record::Ptr { owner, target, ttl, loc } => {
                let (base, is_wild) = strip_wildcard(owner);
                vec![PrimitiveRr {
                    owner: base,
                    rtype: TYPE_PTR,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata: name::pack(target).map(|p| p.0).unwrap_or_default(),
                }]
            }
            Record::Txt { owner, text, ttl, loc } => {
                let (base, is_wild) = strip_wildcard(owner);
                let mut rdata = Vec::new();
                for chunk in text.chunks(TXT_SEGMENT_LEN) {
                    rdata.push(chunk.len() as u8);
                    rdata.extend_from_slice(chunk);
                }
                vec![PrimitiveRr {
                    owner: base,
                    rtype: TYPE_TXT,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata,
                }]
            }
            Record::Generic { owner, rtype, rdata, ttl, loc } => {
                let (base, is_wild) = strip_wildcard(owner);
                vec![PrimitiveRr {
                    owner: base,
                    rtype: *rtype,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata: rdata.clone(),
                }]
            }
            Record::Svcb {
                owner,
                kind,
                priority,
                target,
                params,
                ttl,
                loc,
            } => {
                let mut rdata = priority.to_be_bytes().to_vec();
                rdata.extend(name::pack(target).map(|p| p.0).unwrap_or_default());
                let mut sorted = params.clone();
                sorted.sort_by_key(|(k, _)| *k);
                for (k, v) in sorted {
                    rdata.extend(k.to_be_bytes());
                    rdata.extend((v.len() as u16).to_be_bytes());
                    rdata.extend(v);
                }
                let (base, is_wild) = strip_wildcard(owner);
                let rtype = match kind {
                    SvcbKind::Svcb => TYPE_SVCB,
                    SvcbKind::Https => TYPE_HTTPS,
                };
                vec![PrimitiveRr {
                    owner: base,
                    rtype,
                    is_wildcard: is_wild,
                    loc: loc.clone(),
                    ttl: *ttl,
                    weight: None,
                    rdata,
                }]
            }
        }
    }

    /// Re-serializes the parsed record back to the line format, so that
    /// `parse(record.to_text()) == record` (spec §8 invariant 1).
    pub fn to_text(&self) -> String {
        match self {
            Record::Comment => "#".to_string(),
            Record::Net { cidr_text, loc } => format!("%{},{}", cidr_text, quote(loc)),
            Record::Soa(s) => format!(
                "Z{},{},{},{},{},{},{},{},{}",
                s.owner,
                s.ns,
                s.mbox,
                s.serial.map(|v| v.to_string()).unwrap_or_default(),
                s.refresh,
                s.retry,
                s.expire,
                s.ttl,
                s.minimum
            ),
            Record::Apex {
                owner,
                ns,
                mbox,
                serial,
                refresh,
                retry,
                expire,
                minimum,
                addr,
            } => format!(
                ".{},{},{},{},{},{},{},{},{}",
                owner,
                ns,
                mbox,
                serial.map(|v| v.to_string()).unwrap_or_default(),
                refresh,
                retry,
                expire,
                minimum,
                addr.clone().unwrap_or_default()
            ),
            Record::NsGlue { owner, loc, ns, ttl, .. } => format!("&{},{},{},{}", owner, quote(loc), ns, ttl),
            Record::Addr { owner, addr, ttl, weight, loc } => {
                format!("+{},{},{},{},{}", owner, addr, ttl, weight, quote(loc))
            }
            Record::AddrPtr { owner, addr, ttl, loc } => format!("={},{},{},{}", owner, addr, ttl, quote(loc)),
            Record::Mx { owner, distance, target, ttl, loc, addr } => format!(
                "@{},{},{},{},{},{}",
                owner,
                distance,
                target,
                ttl,
                quote(loc),
                addr.clone().unwrap_or_default()
            ),
            Record::Srv {
                owner,
                priority,
                weight,
                port,
                target,
                ttl,
                loc,
                addr,
            } => format!(
                "S{},{},{},{},{},{},{},{}",
                owner,
                priority,
                weight,
                port,
                target,
                ttl,
                quote(loc),
                addr.clone().unwrap_or_default()
            ),
            Record::Cname { owner, target, ttl, loc } => format!("C{},{},{},{}", owner, target, ttl, quote(loc)),
            Record::Ptr { owner, target, ttl, loc } => format!("^{},{},{},{}", owner, target, ttl, quote(loc)),
            Record::Txt { owner, text, ttl, loc } => format!("'{},{},{},{}", owner, quote(text), ttl, quote(loc)),
            Record::Generic { owner, rtype, rdata, ttl, loc } => {
                format!(":{},{},{},{},{}", owner, rtype, quote(rdata), ttl, quote(loc))
            }
            Record::MapBinding { class, owner, map_id } => {
                let sigil = match class {
                    MapClass::Resolver => 'M',
                    MapClass::Ecs => '8',
                };
                format!("{}{},{}", sigil, owner, quote(map_id))
            }
            Record::RangePoint { raw } => format!("!{}", quote(raw)),
            Record::Svcb {
                owner,
                kind,
                priority,
                target,
                params,
                ttl,
                loc,
            } => {
                let sigil = match kind {
                    SvcbKind::Svcb => 'B',
                    SvcbKind::Https => 'H',
                };
                let params_text = params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, quote(v)))
                    .collect::<Vec<_>>()
                    .join(";");
                format!("{}{},{},{},{},{},{}", sigil, owner, priority, target, ttl, params_text, quote(loc))
            }
        }
    }
}

fn soa_row(s: &SoaFields) -> PrimitiveRr {
    let mut rdata = name::pack(&s.ns).map(|p| p.0).unwrap_or_default();
    rdata.extend(name::pack(&s.mbox).map(|p| p.0).unwrap_or_default());
    rdata.extend(s.serial.unwrap_or(0).to_be_bytes());
    rdata.extend(s.refresh.to_be_bytes());
    rdata.extend(s.retry.to_be_bytes());
    rdata.extend(s.expire.to_be_bytes());
    rdata.extend(s.minimum.to_be_bytes());
    PrimitiveRr {
        owner: s.owner.clone(),
        rtype: TYPE_SOA,
        is_wildcard: false,
        loc: Vec::new(),
        ttl: s.ttl,
        weight: None,
        rdata,
    }
}

fn ns_row(owner: &str, loc: &[u8], ns: &str, ttl: u32) -> PrimitiveRr {
    let (base, is_wild) = strip_wildcard(owner);
    PrimitiveRr {
        owner: base,
        rtype: TYPE_NS,
        is_wildcard: is_wild,
        loc: loc.to_vec(),
        ttl,
        weight: None,
        rdata: name::pack(ns).map(|p| p.0).unwrap_or_default(),
    }
}

fn addr_row(owner: &str, loc: &[u8], addr: &str, ttl: u32, weight: u32) -> PrimitiveRr {
    let (base, is_wild) = strip_wildcard(owner);
    let (rtype, rdata) = encode_addr(addr);
    PrimitiveRr {
        owner: base,
        rtype,
        is_wildcard: is_wild,
        loc: loc.to_vec(),
        ttl,
        weight: Some(weight),
        rdata,
    }
}

fn encode_addr(addr: &str) -> (u16, Vec<u8>) {
    if let Ok(v4) = addr.parse::<std::net::Ipv4Addr>() {
        (TYPE_A, v4.octets().to_vec())
    } else if let Ok(v6) = addr.parse::<std::net::Ipv6Addr>() {
        (TYPE_AAAA, v6.octets().to_vec())
    } else {
        (TYPE_A, Vec::new())
    }
}

/// Builds the `in-addr.arpa`/`ip6.arpa` reverse-DNS name for an address
/// string, used by the `=` sigil's derived PTR record.
fn reverse_dns_name(addr: &str) -> String {
    if let Ok(v4) = addr.parse::<std::net::Ipv4Addr>() {
        let o = v4.octets();
        format!("{}.{}.{}.{}.in-addr.arpa", o[3], o[2], o[1], o[0])
    } else if let Ok(v6) = addr.parse::<std::net::Ipv6Addr>() {
        let hex: String = v6
            .octets()
            .iter()
            .rev()
            .flat_map(|b| vec![format!("{:x}", b & 0xf), format!("{:x}", b >> 4)])
            .collect::<Vec<_>>()
            .join(".");
        format!("{}.ip6.arpa", hex)
    } else {
        addr.to_string()
    }
}

/// Encodes the flag byte per spec §3: `plain|wildcard × unlocated|located`.
pub fn flag_byte(is_wildcard: bool, is_located: bool) -> u8 {
    match (is_wildcard, is_located) {
        (false, false) => FLAG_PLAIN,
        (false, true) => FLAG_PLAIN_LOCATED,
        (true, false) => FLAG_WILDCARD,
        (true, true) => FLAG_WILDCARD_LOCATED,
    }
}

pub fn is_wildcard_flag(flag: u8) -> bool {
    flag == FLAG_WILDCARD || flag == FLAG_WILDCARD_LOCATED
}

pub fn is_located_flag(flag: u8) -> bool {
    flag == FLAG_PLAIN_LOCATED || flag == FLAG_WILDCARD_LOCATED
}

/// Encodes a [`PrimitiveRr`] into its on-disk row bytes (spec §3
/// "Resource Record Row"): type(2) ‖ flag(1) ‖ loc? ‖ ttl(4) ‖ tai(8) ‖
/// weight?(4) ‖ rdata.
pub fn encode_row(rr: &PrimitiveRr) -> DnsDbResult<Vec<u8>> {
    if rr.rdata.len() > u16::MAX as usize {
        return Err(DnsDbError::IntegerOverflow);
    }
    let loc_id = LocationId::from_raw(&rr.loc)?;
    let is_located = !loc_id.is_none();

    let mut row = Vec::with_capacity(rr.rdata.len() + 24);
    row.extend(rr.rtype.to_be_bytes());
    row.push(flag_byte(rr.is_wildcard, is_located));
    if is_located {
        row.extend(loc_id.encode());
    }
    row.extend(rr.ttl.to_be_bytes());
    row.extend([0u8; 8]); // TAI time-to-die: ignored on read
    if let Some(w) = rr.weight {
        row.extend(w.to_be_bytes());
    }
    row.extend(&rr.rdata);
    Ok(row)
}

/// A decoded row, as produced by the record iterator (component G).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    pub rtype: u16,
    pub is_wildcard: bool,
    pub loc_id: LocationId,
    pub ttl: u32,
    pub weight: Option<u32>,
    pub rdata_offset: usize,
    pub rdata: Vec<u8>,
}

pub fn decode_row(row: &[u8]) -> DnsDbResult<DecodedRow> {
    if row.len() < 3 {
        return Err(DnsDbError::UnexpectedEof);
    }
    let rtype = u16::from_be_bytes([row[0], row[1]]);
    let flag = row[2];
    let is_wildcard = is_wildcard_flag(flag);
    let is_located = is_located_flag(flag);
    let mut i = 3usize;

    let loc_id = if is_located {
        let (id, consumed) = LocationId::decode(&row[i..])?;
        i += consumed;
        id
    } else {
        LocationId::none()
    };

    if row.len() < i + 12 {
        return Err(DnsDbError::UnexpectedEof);
    }
    let ttl = u32::from_be_bytes(row[i..i + 4].try_into().unwrap());
    i += 4 + 8; // skip TAI time-to-die

    let weight = if rtype == TYPE_A || rtype == TYPE_AAAA {
        if row.len() < i + 4 {
            return Err(DnsDbError::UnexpectedEof);
        }
        let w = u32::from_be_bytes(row[i..i + 4].try_into().unwrap());
        i += 4;
        Some(w)
    } else {
        None
    };

    Ok(DecodedRow {
        rtype,
        is_wildcard,
        loc_id,
        ttl,
        weight,
        rdata_offset: i,
        rdata: row[i..].to_vec(),
    })
}
