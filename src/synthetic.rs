//! Deterministic synthetic traffic for exercising the detector.
//!
//! The stream mixes three kinds of Ethernet/IPv4/UDP frames:
//!
//! * **rare** every `rare_every` packets: unknown source, odd port, odd TTL
//!   and length;
//! * **occasional** every `occasional_every` packets: the common source and
//!   port but the rare destination and its own length;
//! * **common** everything else, all identical.
//!
//! Packet 0 is rare, so a training window covering it already knows the rare
//! values once, and they come back maximally stale and infrequent.

use crate::error::BuildError;
use etherparse::PacketBuilder;

pub const DEFAULT_RARE_EVERY: u64 = 1000;
pub const DEFAULT_OCCASIONAL_EVERY: u64 = 50;

const LAN_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
const GATEWAY_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0xfe];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Common,
    Occasional,
    Rare,
}

struct Shape {
    src:      [u8; 4],
    dst:      [u8; 4],
    ttl:      u8,
    src_port: u16,
    dst_port: u16,
    payload:  usize,
}

impl Kind {
    fn shape(self) -> Shape {
        match self {
            Kind::Common => Shape {
                src: [10, 0, 0, 1], dst: [10, 0, 0, 2], ttl: 64,
                src_port: 40000, dst_port: 53, payload: 16,
            },
            Kind::Occasional => Shape {
                src: [10, 0, 0, 1], dst: [10, 0, 0, 3], ttl: 64,
                src_port: 40000, dst_port: 53, payload: 32,
            },
            Kind::Rare => Shape {
                src: [172, 16, 6, 6], dst: [10, 0, 0, 3], ttl: 23,
                src_port: 1337, dst_port: 6667, payload: 100,
            },
        }
    }
}

/// Iterator over synthetic frames.
#[derive(Debug, Clone)]
pub struct SyntheticStream {
    next:             u64,
    total:            u64,
    rare_every:       u64,
    occasional_every: u64,
}

impl SyntheticStream {
    /// A stream of `total` frames with the default rare/occasional spacing.
    pub fn new(total: u64) -> Self {
        SyntheticStream {
            next: 0,
            total,
            rare_every: DEFAULT_RARE_EVERY,
            occasional_every: DEFAULT_OCCASIONAL_EVERY,
        }
    }

    /// Overrides the spacing of rare and occasional frames. A spacing of 0
    /// disables that kind.
    pub fn with_spacing(mut self, rare_every: u64, occasional_every: u64) -> Self {
        self.rare_every = rare_every;
        self.occasional_every = occasional_every;
        self
    }

    pub fn kind_of(&self, index: u64) -> Kind {
        let every = |n: u64| n != 0 && index % n == 0;
        if every(self.rare_every) {
            Kind::Rare
        } else if every(self.occasional_every) {
            Kind::Occasional
        } else {
            Kind::Common
        }
    }

    /// Builds the frame for `kind`.
    pub fn build(kind: Kind) -> Result<Vec<u8>, BuildError> {
        let shape = kind.shape();
        let builder = PacketBuilder::ethernet2(LAN_MAC, GATEWAY_MAC)
            .ipv4(shape.src, shape.dst, shape.ttl)
            .udp(shape.src_port, shape.dst_port);

        let payload = vec![0x5a; shape.payload];
        let mut frame = Vec::with_capacity(builder.size(payload.len()));
        builder
            .write(&mut frame, &payload)
            .map_err(|e| BuildError(e.to_string()))?;
        Ok(frame)
    }
}

impl Iterator for SyntheticStream {
    type Item = Result<Vec<u8>, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let kind = self.kind_of(self.next);
        self.next += 1;
        Some(Self::build(kind))
    }
}
