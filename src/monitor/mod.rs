//! Replay engine: feeds frames from a capture file or the synthetic
//! generator through a [`Detector`] and logs what comes out.
//!
//! Everything runs on the calling thread. The shutdown flag is checked
//! between frames, so a frame is always processed completely.

use crate::logger::{Event, SharedLogger};

use novelscan::detect::Verdict;
use novelscan::error::BuildError;
use novelscan::synthetic::SyntheticStream;
use novelscan::{decode, ConfigError, DetectError, Detector, DetectorConfig, Outcome, RunSummary};
use pcap::{Capture, Linktype};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Set to `true` by the ctrlc handler; the replay loop exits before the next frame.
pub type ShutdownFlag = Arc<AtomicBool>;

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// An offline PCAP file.
    Pcap(String),
    /// `n` generated frames.
    Synthetic(u64),
}

/// Configuration bundle passed from `main` into the engine.
pub struct MonitorConfig {
    pub source:   Source,
    /// Detector tunables from CLI args.
    pub detector: DetectorConfig,
    /// When set, decode and print this many packets instead of scoring.
    pub dump:     Option<u64>,
    pub logger:   SharedLogger,
    pub shutdown: ShutdownFlag,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("failed to open PCAP file '{path}': {source}")]
    Open {
        path:   String,
        source: pcap::Error,
    },

    #[error("'{path}' has link type {linktype}; only Ethernet captures can be decoded")]
    UnsupportedLinktype {
        path:     String,
        linktype: String,
    },

    #[error("failed to read packet: {0}")]
    Read(pcap::Error),
}

/// Runs the engine to completion and returns the run counters.
///
/// Returns early with an error if the configuration is invalid, the capture
/// cannot be read, or the detector's statistics become inconsistent.
pub fn start_monitor(cfg: &MonitorConfig) -> Result<RunSummary, MonitorError> {
    match cfg.dump {
        Some(limit) => run_dump(cfg, limit),
        None => run_detection(cfg),
    }
}

// ── Frame sources ────────────────────────────────────────────────────────────

/// Calls `f` on every frame of the configured source until the source is
/// drained, shutdown is requested, or `f` returns `Ok(false)`.
fn each_frame<F>(cfg: &MonitorConfig, mut f: F) -> Result<(), MonitorError>
where
    F: FnMut(&[u8]) -> Result<bool, MonitorError>,
{
    match &cfg.source {
        Source::Pcap(path) => {
            cfg.logger.log(&Event::Info {
                message: &format!("Replay mode: reading from {}", path),
            });
            let mut cap = Capture::from_file(path).map_err(|source| MonitorError::Open {
                path: path.clone(),
                source,
            })?;

            let linktype = cap.get_datalink();
            if linktype != Linktype::ETHERNET {
                return Err(MonitorError::UnsupportedLinktype {
                    path:     path.clone(),
                    linktype: linktype.get_name().unwrap_or_else(|_| linktype.0.to_string()),
                });
            }

            while !cfg.shutdown.load(Ordering::Relaxed) {
                match cap.next_packet() {
                    Ok(pkt) => {
                        if !f(pkt.data)? {
                            break;
                        }
                    }
                    Err(pcap::Error::NoMorePackets) => break,
                    Err(e) => return Err(MonitorError::Read(e)),
                }
            }
        }
        Source::Synthetic(total) => {
            cfg.logger.log(&Event::Info {
                message: &format!("Synthetic mode: generating {} packets", total),
            });
            for frame in SyntheticStream::new(*total) {
                if cfg.shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if !f(&frame?)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

// ── Detection ────────────────────────────────────────────────────────────────

fn run_detection(cfg: &MonitorConfig) -> Result<RunSummary, MonitorError> {
    let mut detector = Detector::new(cfg.detector.clone())?;

    cfg.logger.log(&Event::Info {
        message: &format!(
            "Training on {} packets, threshold {}",
            cfg.detector.max_training, cfg.detector.threshold
        ),
    });

    let mut announced = false;
    each_frame(cfg, |frame| {
        let outcome = detector.process_frame(frame)?;
        report(&cfg.logger, &detector, &outcome);

        // The last training slot may go to a malformed frame.
        if !announced && detector.is_trained() {
            announced = true;
            cfg.logger.log(&Event::TrainingComplete {
                index:  detector.config().max_training,
                fields: detector.store().field_count(),
                values: detector.store().value_count(),
            });
        }
        Ok(!matches!(outcome, Outcome::Exhausted))
    })?;

    Ok(detector.summary())
}

/// Logs whatever is worth logging about one frame.
fn report(logger: &SharedLogger, detector: &Detector, outcome: &Outcome) {
    match outcome {
        Outcome::Malformed { index, error } => {
            logger.log(&Event::Malformed { index: *index, error });
        }
        Outcome::Decoded { verdict: Verdict::Scored(report), .. } if report.anomalous => {
            let (field, value) = report
                .top_field()
                .map(|f| (f.field.as_str(), f.value.as_str()))
                .unwrap_or_default();
            logger.log(&Event::Anomaly {
                index:  report.index,
                score:  report.score,
                field,
                value,
                fields: report.anomalous_fields().collect(),
            });
        }
        Outcome::Decoded { .. } => {}
        Outcome::Exhausted => {
            logger.log(&Event::Info {
                message: &format!("Packet limit of {} reached", detector.config().max_packets),
            });
        }
    }
}

// ── Dump ─────────────────────────────────────────────────────────────────────

/// Decodes and logs the first `limit` frames without scoring them.
fn run_dump(cfg: &MonitorConfig, limit: u64) -> Result<RunSummary, MonitorError> {
    let mut summary = RunSummary::default();

    each_frame(cfg, |frame| {
        if summary.packets >= limit {
            return Ok(false);
        }
        let index = summary.packets;
        summary.packets += 1;

        match decode(frame, cfg.detector.max_layers) {
            Ok(packet) => cfg.logger.log(&Event::Decoded { index, packet: &packet }),
            Err(error) => {
                summary.malformed += 1;
                cfg.logger.log(&Event::Malformed { index, error: &error });
            }
        }
        Ok(summary.packets < limit)
    })?;

    Ok(summary)
}
