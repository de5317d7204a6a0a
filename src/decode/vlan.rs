//! 802.1Q tag. The 16-bit tag control word (priority, DEI and VLAN id) is
//! kept as one opaque value.

use crate::decode::types::FieldSet;
use crate::decode::{be_u16, ensure_len, Protocol};
use crate::error::DecodeError;
use std::fmt;

pub const HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanHeader {
    pub id:       u16,
    pub protocol: u16,
}

impl VlanHeader {
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        ensure_len(Protocol::Vlan, buf, HEADER_SIZE)?;
        let header = VlanHeader {
            id:       be_u16(buf, 0),
            protocol: be_u16(buf, 2),
        };
        Ok((header, &buf[HEADER_SIZE..]))
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(2);
        f.push("vlan_id", self.id);
        f.push("vlan_type", self.protocol);
        f
    }
}

impl fmt::Display for VlanHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vlan packet with id {} type ", self.id)?;
        match Protocol::from_ethertype(self.protocol) {
            Some(p) => write!(f, "{}", p),
            None    => write!(f, "{:#06x}", self.protocol),
        }
    }
}
