//! novelscan: layered frame decoding and online field-novelty scoring.
//!
//! Two pieces make up the library:
//!
//! * [`decode`] turns a raw Ethernet frame into a [`LayeredPacket`]
//!   (Ethernet, 802.1Q, IPv4, TCP, UDP, UDP-Lite), following each header's
//!   protocol identifier down to a caller-chosen depth.
//! * [`detect`] keeps recency and frequency statistics for every scored field
//!   and every (field, value) pair of a packet stream, and scores each new
//!   packet by how unexpected its values are.
//!
//! ```no_run
//! use novelscan::{Detector, DetectorConfig, Outcome, Verdict};
//!
//! # fn frames() -> Vec<Vec<u8>> { Vec::new() }
//! let mut detector = Detector::new(DetectorConfig::default()).unwrap();
//! for frame in frames() {
//!     if let Outcome::Decoded { verdict: Verdict::Scored(report), .. } =
//!         detector.process_frame(&frame).unwrap()
//!     {
//!         if report.anomalous {
//!             println!("packet {} scored {:.3}", report.index, report.score);
//!         }
//!     }
//! }
//! ```

pub mod decode;
pub mod detect;
pub mod error;
pub mod synthetic;

pub use decode::{decode, FieldSet, FieldValue, Header, Layer, LayeredPacket, Protocol};
pub use detect::{Detector, DetectorConfig, Outcome, PacketReport, RunSummary, Verdict};
pub use error::{ConfigError, DecodeError, DetectError};
