//! Layered protocol decoder.
//!
//! [`decode`] turns a raw link-layer frame into a [`LayeredPacket`] by running
//! one extractor per header and following each header's next-protocol
//! identifier through a fixed lookup table:
//!
//! | identifier | protocol |
//! |-----------:|----------|
//! | `0x0800`   | IPv4     |
//! | `0x8100`   | VLAN     |
//! | `0x06`     | TCP      |
//! | `0x11`     | UDP      |
//! | `0x88`     | UDP-Lite |
//!
//! Each header only looks up the rows of its own number space: Ethernet and
//! VLAN resolve ethertypes to IPv4 or VLAN, IPv4 resolves protocol numbers to
//! a transport. An ethertype of `0x0011` is an 802.3 length, not UDP. Any
//! other identifier ends decoding and the remaining bytes are kept as the
//! terminal payload.

pub mod ethernet;
pub mod ipv4;
pub mod tcp;
pub mod types;
pub mod udp;
pub mod vlan;

#[cfg(test)]
pub(crate) mod fixtures;

pub use types::{FieldSet, FieldValue, Header, Layer, LayeredPacket};

use crate::error::DecodeError;
use serde::Serialize;
use std::fmt;

/// Decoding depth used when the caller does not choose one: Ethernet,
/// network and transport layer.
pub const DEFAULT_MAX_LAYERS: usize = 3;

/// Protocols the decoder knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Protocol {
    #[serde(rename = "ethernet")]
    Ethernet,
    #[serde(rename = "vlan")]
    Vlan,
    #[serde(rename = "ipv4")]
    Ipv4,
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    Udp,
    #[serde(rename = "udplite")]
    UdpLite,
}

impl Protocol {
    /// Maps an ethertype or IPv4 protocol number to an extractor.
    pub fn from_id(id: u16) -> Option<Protocol> {
        match id {
            0x0800 => Some(Protocol::Ipv4),
            0x8100 => Some(Protocol::Vlan),
            0x06   => Some(Protocol::Tcp),
            0x11   => Some(Protocol::Udp),
            0x88   => Some(Protocol::UdpLite),
            _      => None,
        }
    }

    /// Protocol carried behind an Ethernet or VLAN header.
    pub fn from_ethertype(ether_type: u16) -> Option<Protocol> {
        Protocol::from_id(ether_type).filter(|p| matches!(p, Protocol::Ipv4 | Protocol::Vlan))
    }

    /// Transport carried behind an IPv4 header.
    pub fn from_ip_protocol(number: u8) -> Option<Protocol> {
        Protocol::from_id(number.into())
            .filter(|p| matches!(p, Protocol::Tcp | Protocol::Udp | Protocol::UdpLite))
    }

    /// Size of the header part every instance of the protocol carries.
    pub fn fixed_header_size(self) -> usize {
        match self {
            Protocol::Ethernet => ethernet::HEADER_SIZE,
            Protocol::Vlan     => vlan::HEADER_SIZE,
            Protocol::Ipv4     => ipv4::MIN_HEADER_SIZE,
            Protocol::Tcp      => tcp::MIN_HEADER_SIZE,
            Protocol::Udp | Protocol::UdpLite => udp::HEADER_SIZE,
        }
    }

    /// Field names of this protocol that feed the anomaly detector.
    ///
    /// Link-layer fields and checksums are decoded for display but not
    /// scored.
    pub fn scored_fields(self) -> &'static [&'static str] {
        match self {
            Protocol::Ethernet | Protocol::Vlan => &[],
            Protocol::Ipv4 => &[
                "ip_ver", "ip_hlen", "ip_tos", "ip_len", "ip_id", "ip_flags",
                "ip_off", "ip_ttl", "ip_proto", "ip_src", "ip_dst",
            ],
            Protocol::Tcp => &[
                "tcp_srcport", "tcp_dstport", "tcp_seqnum", "tcp_acknum",
                "tcp_doff", "tcp_res", "tcp_flags",
            ],
            Protocol::Udp     => &["udp_srcport", "udp_dstport", "udp_len"],
            Protocol::UdpLite => &["udpl_srcport", "udpl_dstport", "udpl_cover"],
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Protocol::Ethernet => "Ethernet",
            Protocol::Vlan     => "VLAN",
            Protocol::Ipv4     => "IPv4",
            Protocol::Tcp      => "TCP",
            Protocol::Udp      => "UDP",
            Protocol::UdpLite  => "UDP-Lite",
        })
    }
}

/// Decodes a raw Ethernet frame into its layers.
///
/// `max_layers` is the depth budget. Each decoded header costs one unit,
/// except an 802.1Q tag and the protocol directly inside it: both belong to
/// the link-layer step already paid for by Ethernet. With a budget of 0 the
/// whole frame comes back as a single payload layer.
///
/// # Errors
///
/// Returns [`DecodeError::TruncatedHeader`] if any header along the way does
/// not fit in the bytes left. No partial packet is returned.
pub fn decode(raw: &[u8], max_layers: usize) -> Result<LayeredPacket, DecodeError> {
    let mut packet = LayeredPacket::default();
    let mut budget = max_layers;
    let mut rest = raw;
    let mut next = Some(Protocol::Ethernet);
    let mut inside_vlan = false;

    while let Some(protocol) = next {
        if budget == 0 {
            break;
        }

        let (header, residual) = Header::parse(protocol, rest)?;

        let is_vlan = protocol == Protocol::Vlan;
        if !is_vlan && !inside_vlan {
            budget -= 1;
        }
        inside_vlan = is_vlan;

        next = header.next_protocol();
        packet.push(Layer::Header(header));
        rest = residual;
    }

    packet.push(Layer::Payload(rest.to_vec()));
    Ok(packet)
}

// ── Byte helpers shared by the extractors ────────────────────────────────────

/// Fails with `TruncatedHeader` unless `buf` holds at least `needed` bytes.
pub(crate) fn ensure_len(protocol: Protocol, buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.len() < needed {
        return Err(DecodeError::TruncatedHeader {
            protocol,
            needed,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Callers must have checked the length first.
pub(crate) fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

pub(crate) fn be_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
