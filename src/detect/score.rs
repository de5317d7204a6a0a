//! Recency/frequency scoring of a single field value.
//!
//! For a value that has been seen before:
//!
//! * time score: packets since the value was last seen, capped at
//!   `max_training`;
//! * frequency score: how often the field has been seen divided by how often
//!   this value has, capped at `max_training`.
//!
//! A value never seen before gets both caps. The product divided by
//! `max_training²` is the normalised score in `[0, 1]`.

use crate::detect::stats::StatisticsStore;
use crate::error::DetectError;
use serde::Serialize;

/// Score of one field of one packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldScore {
    pub field:           String,
    pub value:           String,
    pub time_score:      f64,
    pub frequency_score: f64,
    pub score:           f64,
    pub anomalous:       bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    pub max_training: u64,
    pub threshold:    f64,
}

impl Scorer {
    pub fn new(max_training: u64, threshold: f64) -> Self {
        Scorer { max_training, threshold }
    }

    /// Scores `field = value` for packet `index` against the statistics of the
    /// packets before it. Must be called before the packet's own fields are
    /// observed.
    ///
    /// # Errors
    ///
    /// [`DetectError::MissingFieldStat`] if the store holds the value but not
    /// its field.
    pub fn score(
        &self,
        store: &StatisticsStore,
        field: &str,
        value: &str,
        index: u64,
    ) -> Result<FieldScore, DetectError> {
        let cap = self.max_training as f64;

        let (time_score, frequency_score) = match store.lookup_value(field, value) {
            None => (cap, cap),
            Some(value_stat) => {
                let field_stat = store.lookup_field(field).ok_or_else(|| {
                    DetectError::MissingFieldStat { field: field.to_owned() }
                })?;
                let gap = index.saturating_sub(value_stat.last_seen_index);
                let time = gap.min(self.max_training) as f64;
                let ratio = field_stat.total_seen_count as f64 / value_stat.total_seen_count as f64;
                (time, ratio.min(cap))
            }
        };

        let score = (time_score * frequency_score / (cap * cap)).clamp(0.0, 1.0);

        Ok(FieldScore {
            field: field.to_owned(),
            value: value.to_owned(),
            time_score,
            frequency_score,
            score,
            anomalous: score > self.threshold,
        })
    }
}

/// Packet-level score: the highest field score, and whether any field is
/// anomalous. An empty field list scores 0.
pub fn packet_score(fields: &[FieldScore]) -> (f64, bool) {
    let score = fields.iter().map(|f| f.score).fold(0.0, f64::max);
    let anomalous = fields.iter().any(|f| f.anomalous);
    (score, anomalous)
}
