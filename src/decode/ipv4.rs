//! IPv4 header with options.

use crate::decode::types::{FieldSet, FieldValue};
use crate::decode::{be_u16, ensure_len, Protocol};
use crate::error::DecodeError;
use std::fmt;
use std::net::Ipv4Addr;

pub const MIN_HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version:         u8,
    /// Header length in 32-bit words, as carried on the wire.
    pub header_len:      u8,
    pub tos:             u8,
    pub total_len:       u16,
    pub id:              u16,
    /// Top 3 bits of the flags/fragment word.
    pub flags:           u8,
    /// Low 13 bits of the flags/fragment word.
    pub fragment_offset: u16,
    pub ttl:             u8,
    pub protocol:        u8,
    pub checksum:        u16,
    pub source:          Ipv4Addr,
    pub destination:     Ipv4Addr,
    pub options:         Vec<u8>,
}

impl Ipv4Header {
    /// Parses the fixed header plus any options the header length announces.
    ///
    /// A header length below the 20-byte minimum is treated as "no options";
    /// the payload then starts right after the fixed part. The payload ends
    /// at the total length when the buffer holds that much, so link-layer
    /// padding after the datagram is not handed to the transport layer.
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        ensure_len(Protocol::Ipv4, buf, MIN_HEADER_SIZE)?;

        let version    = buf[0] >> 4;
        let header_len = buf[0] & 0x0f;
        let flags_frag = be_u16(buf, 6);

        let declared = usize::from(header_len) * 4;
        let end = declared.max(MIN_HEADER_SIZE);
        ensure_len(Protocol::Ipv4, buf, end)?;

        let header = Ipv4Header {
            version,
            header_len,
            tos:             buf[1],
            total_len:       be_u16(buf, 2),
            id:              be_u16(buf, 4),
            flags:           (flags_frag >> 13) as u8,
            fragment_offset: flags_frag & 0x1fff,
            ttl:             buf[8],
            protocol:        buf[9],
            checksum:        be_u16(buf, 10),
            source:          Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            destination:     Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
            options:         buf[MIN_HEADER_SIZE..end].to_vec(),
        };
        let total = usize::from(header.total_len);
        let payload = if (end..=buf.len()).contains(&total) {
            &buf[end..total]
        } else {
            &buf[end..]
        };
        Ok((header, payload))
    }

    pub fn header_len_bytes(&self) -> usize {
        usize::from(self.header_len) * 4
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(13);
        f.push("ip_ver", self.version);
        f.push("ip_hlen", self.header_len);
        f.push("ip_tos", self.tos);
        f.push("ip_len", self.total_len);
        f.push("ip_id", self.id);
        f.push("ip_flags", self.flags);
        f.push("ip_off", self.fragment_offset);
        f.push("ip_ttl", self.ttl);
        f.push("ip_proto", self.protocol);
        f.push("ip_sum", self.checksum);
        f.push("ip_src", self.source);
        f.push("ip_dst", self.destination);
        f.push("ip_opt", FieldValue::hex(&self.options));
        f
    }
}

impl fmt::Display for Ipv4Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ipv4 ")?;
        match Protocol::from_ip_protocol(self.protocol) {
            Some(p) => write!(f, "{}", p)?,
            None    => write!(f, "proto {}", self.protocol)?,
        }
        write!(
            f,
            " packet from {} to {} ttl {} length {}",
            self.source, self.destination, self.ttl, self.total_len
        )
    }
}
