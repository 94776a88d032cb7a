use std::io::{Cursor, Result};

use crate::error::DnsDbResult;

/// Functions to encode/decode the handful of Rust primitives used to build
/// the wire-format answer: a DNS message is nothing more than a fixed
/// sequence of big-endian integers and byte strings.
pub trait ToFromNetworkOrder<'a>: std::fmt::Debug {
    /// Append `self`'s network-order encoding to `buffer`, returning the
    /// number of bytes written.
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize>;

    /// Decode `self` from `buffer`, advancing the cursor.
    fn from_network_bytes(&mut self, buffer: &mut Cursor<&'a [u8]>) -> DnsDbResult<()>;
}

pub mod primitive;
