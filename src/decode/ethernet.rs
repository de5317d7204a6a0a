//! Ethernet II header: destination MAC, source MAC, ethertype.

use crate::decode::types::FieldSet;
use crate::decode::{be_u16, ensure_len, Protocol};
use crate::error::DecodeError;
use serde::{Serialize, Serializer};
use std::fmt;

pub const HEADER_SIZE: usize = 14;

/// A 48-bit hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: MacAddr,
    pub source:      MacAddr,
    pub ether_type:  u16,
}

impl EthernetHeader {
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        ensure_len(Protocol::Ethernet, buf, HEADER_SIZE)?;

        let mut destination = [0u8; 6];
        let mut source = [0u8; 6];
        destination.copy_from_slice(&buf[0..6]);
        source.copy_from_slice(&buf[6..12]);

        let header = EthernetHeader {
            destination: MacAddr(destination),
            source:      MacAddr(source),
            ether_type:  be_u16(buf, 12),
        };
        Ok((header, &buf[HEADER_SIZE..]))
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(3);
        f.push("eth_dst", self.destination);
        f.push("eth_src", self.source);
        f.push("eth_type", self.ether_type);
        f
    }
}

impl fmt::Display for EthernetHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ethernet from {} to {} type ", self.source, self.destination)?;
        match Protocol::from_ethertype(self.ether_type) {
            Some(p) => write!(f, "{}", p),
            None    => write!(f, "{:#06x}", self.ether_type),
        }
    }
}
