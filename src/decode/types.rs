//! Data model for decoded frames: field values, field sets, layers and the
//! layered packet that chains them together.

use crate::decode::ethernet::{EthernetHeader, MacAddr};
use crate::decode::ipv4::Ipv4Header;
use crate::decode::tcp::TcpHeader;
use crate::decode::udp::{UdpHeader, UdpLiteHeader};
use crate::decode::vlan::VlanHeader;
use crate::decode::Protocol;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;

// ── Field values ─────────────────────────────────────────────────────────────

/// A single scalar extracted from a header.
///
/// Byte sequences (header options) are kept hex encoded so that every value
/// has a stable textual form; use [`FieldValue::decode_hex`] to get the raw
/// bytes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Uint(u64),
    Bool(bool),
    Hex(String),
    Mac(MacAddr),
    Ipv4(Ipv4Addr),
}

impl FieldValue {
    /// Hex-encodes a byte slice into a [`FieldValue::Hex`].
    pub fn hex(bytes: &[u8]) -> Self {
        FieldValue::Hex(hex::encode(bytes))
    }

    /// Returns the raw bytes behind a hex value, or `None` for other variants
    /// and for strings that are not valid hex.
    pub fn decode_hex(&self) -> Option<Vec<u8>> {
        match self {
            FieldValue::Hex(s) => hex::decode(s).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// The stringified form is what the statistics store keys values by.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Uint(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Hex(s)  => f.write_str(s),
            FieldValue::Mac(m)  => write!(f, "{}", m),
            FieldValue::Ipv4(a) => write!(f, "{}", a),
        }
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self { FieldValue::Uint(v.into()) }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self { FieldValue::Uint(v.into()) }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self { FieldValue::Uint(v.into()) }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self { FieldValue::Bool(b) }
}

impl From<MacAddr> for FieldValue {
    fn from(m: MacAddr) -> Self { FieldValue::Mac(m) }
}

impl From<Ipv4Addr> for FieldValue {
    fn from(a: Ipv4Addr) -> Self { FieldValue::Ipv4(a) }
}

// ── Field sets ───────────────────────────────────────────────────────────────

/// Named fields of one header, in wire order.
///
/// Order is for display only; lookups go by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<(&'static str, FieldValue)>,
}

impl FieldSet {
    pub fn with_capacity(n: usize) -> Self {
        Self { fields: Vec::with_capacity(n) }
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<FieldValue>) {
        self.fields.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ── Headers ──────────────────────────────────────────────────────────────────

/// One decoded protocol header.
///
/// The set of variants is closed: supporting a new protocol means adding a
/// variant here, a [`Protocol`] variant and an entry in [`Protocol::from_id`] plus the
/// number-space filter that admits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Ethernet(EthernetHeader),
    Vlan(VlanHeader),
    Ipv4(Ipv4Header),
    Tcp(TcpHeader),
    Udp(UdpHeader),
    UdpLite(UdpLiteHeader),
}

impl Header {
    /// Runs the extractor for `protocol` over `buf`, returning the header and
    /// the residual bytes that follow it.
    pub fn parse(protocol: Protocol, buf: &[u8]) -> Result<(Header, &[u8]), crate::DecodeError> {
        Ok(match protocol {
            Protocol::Ethernet => {
                let (h, rest) = EthernetHeader::parse(buf)?;
                (Header::Ethernet(h), rest)
            }
            Protocol::Vlan => {
                let (h, rest) = VlanHeader::parse(buf)?;
                (Header::Vlan(h), rest)
            }
            Protocol::Ipv4 => {
                let (h, rest) = Ipv4Header::parse(buf)?;
                (Header::Ipv4(h), rest)
            }
            Protocol::Tcp => {
                let (h, rest) = TcpHeader::parse(buf)?;
                (Header::Tcp(h), rest)
            }
            Protocol::Udp => {
                let (h, rest) = UdpHeader::parse(buf)?;
                (Header::Udp(h), rest)
            }
            Protocol::UdpLite => {
                let (h, rest) = UdpLiteHeader::parse(buf)?;
                (Header::UdpLite(h), rest)
            }
        })
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Header::Ethernet(_) => Protocol::Ethernet,
            Header::Vlan(_)     => Protocol::Vlan,
            Header::Ipv4(_)     => Protocol::Ipv4,
            Header::Tcp(_)      => Protocol::Tcp,
            Header::Udp(_)      => Protocol::Udp,
            Header::UdpLite(_)  => Protocol::UdpLite,
        }
    }

    /// Known protocol carried in this header's payload, looked up in the
    /// number space the header's identifier belongs to.
    pub fn next_protocol(&self) -> Option<Protocol> {
        match self {
            Header::Ethernet(h) => Protocol::from_ethertype(h.ether_type),
            Header::Vlan(h)     => Protocol::from_ethertype(h.protocol),
            Header::Ipv4(h)     => Protocol::from_ip_protocol(h.protocol),
            Header::Tcp(_) | Header::Udp(_) | Header::UdpLite(_) => None,
        }
    }

    pub fn fields(&self) -> FieldSet {
        match self {
            Header::Ethernet(h) => h.to_fields(),
            Header::Vlan(h)     => h.to_fields(),
            Header::Ipv4(h)     => h.to_fields(),
            Header::Tcp(h)      => h.to_fields(),
            Header::Udp(h)      => h.to_fields(),
            Header::UdpLite(h)  => h.to_fields(),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Ethernet(h) => fmt::Display::fmt(h, f),
            Header::Vlan(h)     => fmt::Display::fmt(h, f),
            Header::Ipv4(h)     => fmt::Display::fmt(h, f),
            Header::Tcp(h)      => fmt::Display::fmt(h, f),
            Header::Udp(h)      => fmt::Display::fmt(h, f),
            Header::UdpLite(h)  => fmt::Display::fmt(h, f),
        }
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Header", 2)?;
        s.serialize_field("protocol", &self.protocol())?;
        s.serialize_field("fields", &self.fields())?;
        s.end()
    }
}

// ── Layers ───────────────────────────────────────────────────────────────────

/// One entry of a [`LayeredPacket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// A decoded protocol header.
    Header(Header),
    /// Residual bytes that were not decoded, either because no extractor is
    /// known for them or because the depth budget ran out.
    Payload(#[serde(serialize_with = "hex::serialize")] Vec<u8>),
}

/// A decoded frame, outermost layer first.
///
/// A packet produced by [`crate::decode::decode`] always ends with exactly
/// one [`Layer::Payload`], which may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayeredPacket {
    layers: Vec<Layer>,
}

impl LayeredPacket {
    pub(crate) fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn headers(&self) -> impl Iterator<Item = &Header> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Header(h) => Some(h),
            Layer::Payload(_) => None,
        })
    }

    pub fn protocols(&self) -> Vec<Protocol> {
        self.headers().map(Header::protocol).collect()
    }

    /// First header of the given protocol, if the packet carries one.
    pub fn header(&self, protocol: Protocol) -> Option<&Header> {
        self.headers().find(|h| h.protocol() == protocol)
    }

    /// The terminal undecoded bytes.
    pub fn payload(&self) -> &[u8] {
        match self.layers.last() {
            Some(Layer::Payload(p)) => p,
            _ => &[],
        }
    }

    /// Fields fed to the anomaly detector, outermost layer first.
    ///
    /// Only the fields each protocol marks as scored are returned; link-layer
    /// headers contribute none.
    pub fn scored_fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut out = Vec::new();
        for header in self.headers() {
            let wanted = header.protocol().scored_fields();
            if wanted.is_empty() {
                continue;
            }
            out.extend(
                header
                    .fields()
                    .iter()
                    .filter(|(name, _)| wanted.contains(name))
                    .map(|(name, value)| (name, value.clone())),
            );
        }
        out
    }
}

impl fmt::Display for LayeredPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, layer) in self.layers.iter().enumerate() {
            if depth > 0 {
                writeln!(f)?;
            }
            write!(f, "{:indent$}", "", indent = depth * 2)?;
            match layer {
                Layer::Header(h) => write!(f, "{}", h)?,
                Layer::Payload(p) => write!(f, "payload of {} bytes", p.len())?,
            }
        }
        Ok(())
    }
}
