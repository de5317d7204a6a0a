//! UDP and UDP-Lite headers. Both are four big-endian 16-bit words; UDP-Lite
//! replaces the length with the checksum coverage (RFC 3828).

use crate::decode::types::FieldSet;
use crate::decode::{be_u16, ensure_len, Protocol};
use crate::error::DecodeError;
use std::fmt;

pub const HEADER_SIZE: usize = 8;

fn words(protocol: Protocol, buf: &[u8]) -> Result<([u16; 4], &[u8]), DecodeError> {
    ensure_len(protocol, buf, HEADER_SIZE)?;
    let w = [be_u16(buf, 0), be_u16(buf, 2), be_u16(buf, 4), be_u16(buf, 6)];
    Ok((w, &buf[HEADER_SIZE..]))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length:   u16,
    pub checksum: u16,
}

impl UdpHeader {
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let ([src_port, dst_port, length, checksum], rest) = words(Protocol::Udp, buf)?;
        Ok((UdpHeader { src_port, dst_port, length, checksum }, rest))
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(4);
        f.push("udp_srcport", self.src_port);
        f.push("udp_dstport", self.dst_port);
        f.push("udp_len", self.length);
        f.push("udp_sum", self.checksum);
        f
    }
}

impl fmt::Display for UdpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "udp packet from port {} to port {} length {}",
            self.src_port, self.dst_port, self.length
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpLiteHeader {
    pub src_port: u16,
    pub dst_port: u16,
    /// Octets covered by the checksum, counted from the start of the header.
    pub coverage: u16,
    pub checksum: u16,
}

impl UdpLiteHeader {
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        let ([src_port, dst_port, coverage, checksum], rest) = words(Protocol::UdpLite, buf)?;
        Ok((UdpLiteHeader { src_port, dst_port, coverage, checksum }, rest))
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(4);
        f.push("udpl_srcport", self.src_port);
        f.push("udpl_dstport", self.dst_port);
        f.push("udpl_cover", self.coverage);
        f.push("udpl_sum", self.checksum);
        f
    }
}

impl fmt::Display for UdpLiteHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "udplite packet from port {} to port {} coverage {}",
            self.src_port, self.dst_port, self.coverage
        )
    }
}
