//! TCP header.
//!
//! Byte 12 holds the data offset in its top nibble and the reserved bits in
//! its low nibble; the lowest of those is the ECN-nonce flag. Byte 13 holds
//! the remaining eight flags, CWR down to FIN. The nine flags are exposed
//! individually and both raw nibble/byte values are kept too.

use crate::decode::types::{FieldSet, FieldValue};
use crate::decode::{be_u16, be_u32, ensure_len, Protocol};
use crate::error::DecodeError;
use std::fmt;

pub const MIN_HEADER_SIZE: usize = 20;

/// The nine single-bit TCP flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub ecn: bool,
    pub cwr: bool,
    pub ece: bool,
    pub urg: bool,
    pub ack: bool,
    pub psh: bool,
    pub rst: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TcpFlags {
    /// Unpacks the flags from the data-offset byte and the flag byte.
    pub fn from_bytes(offset_byte: u8, flag_byte: u8) -> Self {
        TcpFlags {
            ecn: offset_byte & 0x01 != 0,
            cwr: flag_byte & 0x80 != 0,
            ece: flag_byte & 0x40 != 0,
            urg: flag_byte & 0x20 != 0,
            ack: flag_byte & 0x10 != 0,
            psh: flag_byte & 0x08 != 0,
            rst: flag_byte & 0x04 != 0,
            syn: flag_byte & 0x02 != 0,
            fin: flag_byte & 0x01 != 0,
        }
    }

    /// One letter per set flag, e.g. `SA` for a SYN-ACK.
    pub fn letters(&self) -> String {
        [
            (self.syn, 'S'),
            (self.ack, 'A'),
            (self.rst, 'R'),
            (self.fin, 'F'),
            (self.urg, 'U'),
            (self.psh, 'P'),
            (self.cwr, 'C'),
            (self.ece, 'E'),
            (self.ecn, 'N'),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .map(|(_, c)| *c)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpHeader {
    pub src_port:    u16,
    pub dst_port:    u16,
    pub seq:         u32,
    pub ack:         u32,
    /// Header length in bytes (offset nibble × 4).
    pub data_offset: u8,
    /// Low nibble of the data-offset byte.
    pub reserved:    u8,
    /// The flag byte (CWR..FIN) as a whole.
    pub flag_byte:   u8,
    pub flags:       TcpFlags,
    pub window:      u16,
    pub checksum:    u16,
    /// Urgent pointer scaled by 4.
    pub urgent:      u32,
    pub options:     Vec<u8>,
}

impl TcpHeader {
    /// Parses the header and returns it with the segment payload.
    ///
    /// A data offset below 20 leaves both the options and the payload empty.
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        ensure_len(Protocol::Tcp, buf, MIN_HEADER_SIZE)?;

        let offset_byte = buf[12];
        let flag_byte = buf[13];
        let data_offset = 4 * (offset_byte >> 4);
        let declared = usize::from(data_offset);

        let (options, rest): (&[u8], &[u8]) = if declared < MIN_HEADER_SIZE {
            (&[], &[])
        } else {
            ensure_len(Protocol::Tcp, buf, declared)?;
            (&buf[MIN_HEADER_SIZE..declared], &buf[declared..])
        };

        let header = TcpHeader {
            src_port:    be_u16(buf, 0),
            dst_port:    be_u16(buf, 2),
            seq:         be_u32(buf, 4),
            ack:         be_u32(buf, 8),
            data_offset,
            reserved:    offset_byte & 0x0f,
            flag_byte,
            flags:       TcpFlags::from_bytes(offset_byte, flag_byte),
            window:      be_u16(buf, 14),
            checksum:    be_u16(buf, 16),
            urgent:      4 * u32::from(be_u16(buf, 18)),
            options:     options.to_vec(),
        };
        Ok((header, rest))
    }

    pub fn to_fields(&self) -> FieldSet {
        let mut f = FieldSet::with_capacity(20);
        f.push("tcp_srcport", self.src_port);
        f.push("tcp_dstport", self.dst_port);
        f.push("tcp_seqnum", self.seq);
        f.push("tcp_acknum", self.ack);
        f.push("tcp_doff", self.data_offset);
        f.push("tcp_res", self.reserved);
        f.push("tcp_flags", self.flag_byte);
        f.push("tcp_ecn", self.flags.ecn);
        f.push("tcp_cwr", self.flags.cwr);
        f.push("tcp_ece", self.flags.ece);
        f.push("tcp_urg", self.flags.urg);
        f.push("tcp_ack", self.flags.ack);
        f.push("tcp_psh", self.flags.psh);
        f.push("tcp_rst", self.flags.rst);
        f.push("tcp_syn", self.flags.syn);
        f.push("tcp_fin", self.flags.fin);
        f.push("tcp_win", self.window);
        f.push("tcp_sum", self.checksum);
        f.push("tcp_urp", self.urgent);
        f.push("tcp_opt", FieldValue::hex(&self.options));
        f
    }
}

impl fmt::Display for TcpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tcp {} packet from port {} to port {}",
            self.flags.letters(),
            self.src_port,
            self.dst_port
        )
    }
}
