//! Network-order (big-endian) encode/decode for the primitives the wire
//! module builds DNS messages out of.
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Result};

use crate::network_order::ToFromNetworkOrder;

impl<'a> ToFromNetworkOrder<'a> for u8 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u8(*self)?;
        Ok(1)
    }

    fn from_network_bytes(&mut self, buffer: &mut Cursor<&[u8]>) -> crate::error::DnsDbResult<()> {
        *self = buffer.read_u8()?;
        Ok(())
    }
}

impl<'a> ToFromNetworkOrder<'a> for u16 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u16::<BigEndian>(*self)?;
        Ok(2)
    }

    fn from_network_bytes(&mut self, buffer: &mut Cursor<&[u8]>) -> crate::error::DnsDbResult<()> {
        *self = buffer.read_u16::<BigEndian>()?;
        Ok(())
    }
}

impl<'a> ToFromNetworkOrder<'a> for u32 {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.write_u32::<BigEndian>(*self)?;
        Ok(4)
    }

    fn from_network_bytes(&mut self, buffer: &mut Cursor<&[u8]>) -> crate::error::DnsDbResult<()> {
        *self = buffer.read_u32::<BigEndian>()?;
        Ok(())
    }
}

impl<'a> ToFromNetworkOrder<'a> for &'a [u8] {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        buffer.extend_from_slice(self);
        Ok(self.len())
    }

    fn from_network_bytes(&mut self, _buffer: &mut Cursor<&'a [u8]>) -> crate::error::DnsDbResult<()> {
        Ok(())
    }
}

impl<'a, T: ToFromNetworkOrder<'a>> ToFromNetworkOrder<'a> for Option<T> {
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        match self {
            Some(inner) => inner.to_network_bytes(buffer),
            None => Ok(0),
        }
    }

    fn from_network_bytes(&mut self, buffer: &mut Cursor<&'a [u8]>) -> crate::error::DnsDbResult<()> {
        match self.as_mut() {
            Some(inner) => inner.from_network_bytes(buffer),
            None => Ok(()),
        }
    }
}

impl<'a, T> ToFromNetworkOrder<'a> for Vec<T>
where
    T: ToFromNetworkOrder<'a>,
{
    fn to_network_bytes(&self, buffer: &mut Vec<u8>) -> Result<usize> {
        let mut length = 0usize;
        for item in self {
            length += item.to_network_bytes(buffer)?;
        }
        Ok(length)
    }

    fn from_network_bytes(&mut self, _buffer: &mut Cursor<&'a [u8]>) -> crate::error::DnsDbResult<()> {
        // the wire module only ever builds outgoing messages (see
        // SPEC_FULL.md's wire-format-answer-encoding section): decode is
        // intentionally unimplemented here.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_round_trip() {
        let mut buffer: Vec<u8> = Vec::new();
        assert_eq!(255u8.to_network_bytes(&mut buffer).unwrap(), 1);
        assert_eq!(buffer, &[0xFF]);

        let mut cursor = Cursor::new(buffer.as_slice());
        let mut v = 0u8;
        v.from_network_bytes(&mut cursor).unwrap();
        assert_eq!(v, 255);
    }

    #[test]
    fn u16_round_trip() {
        let mut buffer: Vec<u8> = Vec::new();
        assert_eq!(0x1234u16.to_network_bytes(&mut buffer).unwrap(), 2);
        assert_eq!(buffer, &[0x12, 0x34]);

        let mut cursor = Cursor::new(buffer.as_slice());
        let mut v = 0u16;
        v.from_network_bytes(&mut cursor).unwrap();
        assert_eq!(v, 0x1234);
    }

    #[test]
    fn u32_round_trip() {
        let mut buffer: Vec<u8> = Vec::new();
        assert_eq!(0x12345678u32.to_network_bytes(&mut buffer).unwrap(), 4);
        assert_eq!(buffer, &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn option_none_writes_nothing() {
        let mut buffer: Vec<u8> = Vec::new();
        let v: Option<u8> = None;
        assert_eq!(v.to_network_bytes(&mut buffer).unwrap(), 0);
        assert!(buffer.is_empty());
    }
}
