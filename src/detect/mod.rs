//! Online anomaly detection over a stream of frames.
//!
//! A [`Detector`] owns the statistics of exactly one packet stream. Frames are
//! fed in capture order; each one is assigned the next packet ordinal whether
//! or not it decodes. The first `max_training` ordinals only seed the
//! statistics. From then on every packet's fields are scored against the
//! statistics of the packets before it, and only then observed.

pub mod config;
pub mod score;
pub mod stats;

pub use config::DetectorConfig;
pub use score::{packet_score, FieldScore, Scorer};
pub use stats::{FieldStat, StatisticsStore, ValueStat};

use crate::decode::{decode, LayeredPacket};
use crate::error::{ConfigError, DecodeError, DetectError};
use serde::Serialize;

/// Result of scoring one packet after training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketReport {
    pub index:     u64,
    /// Highest field score of the packet.
    pub score:     f64,
    pub anomalous: bool,
    /// Every scored field, outermost layer first.
    pub fields:    Vec<FieldScore>,
}

impl PacketReport {
    /// The field responsible for the packet score. Ties go to the field that
    /// comes first in the packet.
    pub fn top_field(&self) -> Option<&FieldScore> {
        self.fields
            .iter()
            .fold(None, |best: Option<&FieldScore>, f| match best {
                Some(b) if b.score >= f.score => Some(b),
                _ => Some(f),
            })
    }

    /// The fields that crossed the threshold.
    pub fn anomalous_fields(&self) -> impl Iterator<Item = &FieldScore> {
        self.fields.iter().filter(|f| f.anomalous)
    }
}

/// What happened to a packet's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Inside the training window: observed, not scored.
    Training { index: u64 },
    Scored(PacketReport),
}

impl Verdict {
    pub fn index(&self) -> u64 {
        match self {
            Verdict::Training { index } => *index,
            Verdict::Scored(r) => r.index,
        }
    }
}

/// What happened to a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Decoded {
        packet:  LayeredPacket,
        verdict: Verdict,
    },
    /// The frame did not decode. It used up an ordinal but left the
    /// statistics untouched.
    Malformed {
        index: u64,
        error: DecodeError,
    },
    /// `max_packets` ordinals have been handed out; the frame was ignored.
    Exhausted,
}

/// Counters for the end-of-run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub packets:         u64,
    pub trained:         u64,
    pub scored:          u64,
    pub malformed:       u64,
    pub anomalies:       u64,
    pub distinct_fields: usize,
    pub distinct_values: usize,
}

/// Training/detection driver for one packet stream.
#[derive(Debug)]
pub struct Detector {
    config:     DetectorConfig,
    scorer:     Scorer,
    store:      StatisticsStore,
    next_index: u64,
    summary:    RunSummary,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Detector {
            scorer: Scorer::new(config.max_training, config.threshold),
            config,
            store: StatisticsStore::new(),
            next_index: 0,
            summary: RunSummary::default(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &StatisticsStore {
        &self.store
    }

    /// Ordinal the next packet will get.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// `true` once the training window has been consumed.
    pub fn is_trained(&self) -> bool {
        self.next_index >= self.config.max_training
    }

    /// `true` once `max_packets` ordinals have been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.config.max_packets
    }

    /// Decodes one raw frame and runs its scored fields through the model.
    ///
    /// # Errors
    ///
    /// Only [`DetectError::MissingFieldStat`]; a frame that fails to decode is
    /// reported as [`Outcome::Malformed`], not as an error.
    pub fn process_frame(&mut self, frame: &[u8]) -> Result<Outcome, DetectError> {
        if self.is_exhausted() {
            return Ok(Outcome::Exhausted);
        }

        let packet = match decode(frame, self.config.max_layers) {
            Ok(p) => p,
            Err(error) => {
                let index = self.take_index();
                self.summary.malformed += 1;
                return Ok(Outcome::Malformed { index, error });
            }
        };

        let fields: Vec<(&'static str, String)> = packet
            .scored_fields()
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();

        match self.process_fields(&fields)? {
            Some(verdict) => Ok(Outcome::Decoded { packet, verdict }),
            None => Ok(Outcome::Exhausted),
        }
    }

    /// Runs an already-extracted field list through the model as one packet.
    ///
    /// Returns `None` when the run is exhausted.
    pub fn process_fields<N, V>(&mut self, fields: &[(N, V)]) -> Result<Option<Verdict>, DetectError>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        if self.is_exhausted() {
            return Ok(None);
        }
        let index = self.take_index();

        if index < self.config.max_training {
            self.observe_all(fields, index);
            self.summary.trained += 1;
            return Ok(Some(Verdict::Training { index }));
        }

        let scores = fields
            .iter()
            .map(|(name, value)| self.scorer.score(&self.store, name.as_ref(), value.as_ref(), index))
            .collect::<Result<Vec<_>, _>>()?;
        self.observe_all(fields, index);

        let (score, anomalous) = packet_score(&scores);
        self.summary.scored += 1;
        if anomalous {
            self.summary.anomalies += 1;
        }

        Ok(Some(Verdict::Scored(PacketReport {
            index,
            score,
            anomalous,
            fields: scores,
        })))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            distinct_fields: self.store.field_count(),
            distinct_values: self.store.value_count(),
            ..self.summary
        }
    }

    fn take_index(&mut self) -> u64 {
        let index = self.next_index;
        self.next_index += 1;
        self.summary.packets += 1;
        index
    }

    fn observe_all<N: AsRef<str>, V: AsRef<str>>(&mut self, fields: &[(N, V)], index: u64) {
        for (name, value) in fields {
            self.store.observe(name.as_ref(), value.as_ref(), index);
        }
    }
}
