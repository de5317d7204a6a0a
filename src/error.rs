//! Error taxonomy for decoding and detection.
//!
//! Decode errors are local to one frame: the caller counts them and moves on
//! to the next frame. Detection errors indicate broken bookkeeping inside the
//! statistics store and abort the run. An unknown protocol identifier is not
//! an error at all; the dispatcher simply stops and keeps the residual bytes.

use crate::decode::Protocol;
use thiserror::Error;

/// A frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer is shorter than the header the protocol requires.
    ///
    /// `needed` is the fixed header size, or the declared header length when
    /// the header announces options that run past the end of the buffer.
    #[error("truncated {protocol} header: need {needed} bytes, have {available}")]
    TruncatedHeader {
        protocol:  Protocol,
        needed:    usize,
        available: usize,
    },
}

/// The detector's statistics are inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    /// A value statistic exists for a field that has no field statistic.
    #[error("internal consistency error: value seen for field '{field}' without a field statistic")]
    MissingFieldStat { field: String },
}

/// Invalid detector tunables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_training must be at least 1")]
    ZeroTraining,

    #[error("threshold must be a finite number within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),
}

/// A synthetic frame could not be assembled.
#[derive(Debug, Error)]
#[error("cannot build synthetic frame: {0}")]
pub struct BuildError(pub String);
