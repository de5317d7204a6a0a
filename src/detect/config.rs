use crate::decode::DEFAULT_MAX_LAYERS;
use crate::error::ConfigError;

/// Number of leading packets used only to seed the statistics.
///
/// During this window nothing is scored. The value is also the ceiling of
/// both the time score and the frequency score, so it sets the resolution of
/// the normalised score: a field needs a gap and a rarity ratio close to this
/// value before it approaches 1.0.
pub const DEFAULT_MAX_TRAINING: u64 = 400;

/// Total packets processed in one run, training window included.
///
/// Frames offered after this many packets are refused and the run ends.
pub const DEFAULT_MAX_PACKETS: u64 = 10_000;

/// Normalised score above which a field is reported as anomalous.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Tunables for one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub max_training: u64,
    pub max_packets:  u64,
    pub threshold:    f64,
    /// Depth budget handed to the decoder.
    pub max_layers:   usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            max_training: DEFAULT_MAX_TRAINING,
            max_packets:  DEFAULT_MAX_PACKETS,
            threshold:    DEFAULT_THRESHOLD,
            max_layers:   DEFAULT_MAX_LAYERS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_training == 0 {
            return Err(ConfigError::ZeroTraining);
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        Ok(())
    }
}
