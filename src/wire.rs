//! RFC 1035 message encoder. This crate answers queries with rows out of
//! storage, not wire bytes, but a caller embedding it as a full server
//! needs that last step — so the encode half of the wire codec lives
//! here, built with the same derive macros the teacher's protocol crate
//! used for its message structs. Decode is intentionally unimplemented:
//! nothing in this crate ever needs to parse a message it didn't build.
use dnsdb_derive::WireStruct;

use crate::error::{DnsDbError, DnsDbResult};
use crate::error::DnsDbResult as DNSResult;
use crate::network_order::ToFromNetworkOrder;
use crate::record::{DecodedRow, TYPE_A, TYPE_AAAA};

pub const CLASS_IN: u16 = 1;

#[derive(Debug, Default, Clone, WireStruct)]
pub struct Header {
    pub id: u16,
    pub flags: u16,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

pub const FLAG_QR: u16 = 0x8000;
pub const FLAG_AA: u16 = 0x0400;
pub const FLAG_RCODE_NOERROR: u16 = 0;
pub const FLAG_RCODE_NXDOMAIN: u16 = 3;

#[derive(Debug, Default, Clone, WireStruct)]
pub struct Question {
    pub qname: Vec<u8>,
    pub qtype: u16,
    pub qclass: u16,
}

#[derive(Debug, Default, Clone, WireStruct)]
pub struct WireRr {
    pub name: Vec<u8>,
    pub rtype: u16,
    pub rclass: u16,
    pub ttl: u32,
    pub rdlength: u16,
    pub rdata: Vec<u8>,
}

impl WireRr {
    pub fn from_row(owner_packed: &[u8], row: &DecodedRow) -> DnsDbResult<Self> {
        let rdlength: u16 = row.rdata.len().try_into().map_err(|_| DnsDbError::IntegerOverflow)?;
        Ok(WireRr {
            name: owner_packed.to_vec(),
            rtype: row.rtype,
            rclass: CLASS_IN,
            ttl: row.ttl,
            rdlength,
            rdata: row.rdata.clone(),
        })
    }
}

/// A fully built outgoing message: one question plus answer, authority
/// and additional sections, each already resolved to concrete rows.
#[derive(Debug, Default, Clone)]
pub struct Message {
    pub header: Header,
    pub question: Option<Question>,
    pub answers: Vec<WireRr>,
    pub authority: Vec<WireRr>,
    pub additional: Vec<WireRr>,
}

impl Message {
    pub fn new(id: u16, qname: Vec<u8>, qtype: u16) -> Self {
        Message {
            header: Header {
                id,
                flags: 0,
                qdcount: 1,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            },
            question: Some(Question {
                qname,
                qtype,
                qclass: CLASS_IN,
            }),
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn set_rcode(&mut self, rcode: u16) {
        self.header.flags = (self.header.flags & !0x000F) | (rcode & 0x000F);
    }

    /// Serializes the message to wire bytes, finalizing the section
    /// counts in the header from the accumulated record vectors.
    pub fn encode(&self) -> DnsDbResult<Vec<u8>> {
        let mut header = self.header.clone();
        header.flags |= FLAG_QR;
        header.ancount = self.answers.len() as u16;
        header.nscount = self.authority.len() as u16;
        header.arcount = self.additional.len() as u16;

        let mut buffer = Vec::new();
        header.to_network_bytes(&mut buffer).map_err(DnsDbError::Io)?;
        if let Some(q) = &self.question {
            q.to_network_bytes(&mut buffer).map_err(DnsDbError::Io)?;
        }
        for section in [&self.answers, &self.authority, &self.additional] {
            for rr in section {
                rr.to_network_bytes(&mut buffer).map_err(DnsDbError::Io)?;
            }
        }
        Ok(buffer)
    }
}

pub fn is_address_type(rtype: u16) -> bool {
    rtype == TYPE_A || rtype == TYPE_AAAA
}
