use crate::monitor::Source;
use clap::Parser;
use novelscan::decode::DEFAULT_MAX_LAYERS;
use novelscan::detect::config::{DEFAULT_MAX_PACKETS, DEFAULT_MAX_TRAINING, DEFAULT_THRESHOLD};

/// novelscan: field-novelty anomaly detection over captured traffic.
///
/// Decodes every frame into its protocol layers, learns how often and how
/// recently each header value appears during a training window, then flags
/// packets carrying values that are both stale and rare.
#[derive(Parser, Debug, Clone)]
#[command(
    name    = "novelscan",
    version,
    about   = "Layered packet decoding and field-novelty anomaly detection",
    long_about = None,
)]
pub struct Cli {
    // ── Input ────────────────────────────────────────────────────────────────

    /// Read packets from a saved PCAP file.
    #[arg(
        short = 'r',
        long = "read",
        value_name = "FILE",
        required_unless_present = "synthetic",
        conflicts_with = "synthetic",
    )]
    pub pcap_file: Option<String>,

    /// Feed N generated packets instead of reading a capture.
    ///
    /// Every 1000th packet is rare and every 50th occasional; everything
    /// else is identical common traffic.
    #[arg(long = "synthetic", value_name = "N")]
    pub synthetic: Option<u64>,

    /// Print the first N decoded packets and exit without scoring.
    #[arg(long = "dump", value_name = "N")]
    pub dump: Option<u64>,

    // ── Logging ──────────────────────────────────────────────────────────────

    /// Append log output to this file in addition to stdout.
    #[arg(short = 'o', long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Emit log entries as newline-delimited JSON (NDJSON).
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    // ── Detection ────────────────────────────────────────────────────────────

    /// Packets used only to seed the statistics before scoring starts.
    #[arg(long = "max-training", value_name = "N", default_value_t = DEFAULT_MAX_TRAINING)]
    pub max_training: u64,

    /// Stop after this many packets, training included.
    #[arg(long = "max-packets", value_name = "N", default_value_t = DEFAULT_MAX_PACKETS)]
    pub max_packets: u64,

    /// Field score above which a packet is reported as anomalous.
    #[arg(long = "threshold", value_name = "SCORE", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Maximum number of protocol layers decoded per frame.
    #[arg(long = "max-layers", value_name = "N", default_value_t = DEFAULT_MAX_LAYERS)]
    pub max_layers: usize,
}

impl Cli {
    /// The frame source picked on the command line. clap guarantees exactly
    /// one of `--read` and `--synthetic`, so this is `None` only for a `Cli`
    /// built by hand.
    pub fn source(&self) -> Option<Source> {
        self.pcap_file
            .clone()
            .map(Source::Pcap)
            .or_else(|| self.synthetic.map(Source::Synthetic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_detector_defaults() {
        let cli = Cli::try_parse_from(["novelscan", "-r", "trace.pcap"]).unwrap();
        assert_eq!(cli.pcap_file.as_deref(), Some("trace.pcap"));
        assert_eq!(cli.max_training, 400);
        assert_eq!(cli.max_packets, 10_000);
        assert_eq!(cli.threshold, 0.9);
        assert_eq!(cli.max_layers, 3);
        assert!(!cli.json);
    }

    #[test]
    fn needs_exactly_one_input() {
        assert!(Cli::try_parse_from(["novelscan"]).is_err());
        assert!(Cli::try_parse_from(["novelscan", "-r", "a.pcap", "--synthetic", "10"]).is_err());
        let cli = Cli::try_parse_from(["novelscan", "--synthetic", "10", "--dump", "3", "-j"]).unwrap();
        assert_eq!(cli.synthetic, Some(10));
        assert_eq!(cli.dump, Some(3));
        assert!(cli.json);
    }

    #[test]
    fn source_follows_the_input_flag() {
        let cli = Cli::try_parse_from(["novelscan", "-r", "trace.pcap"]).unwrap();
        assert!(matches!(cli.source(), Some(Source::Pcap(p)) if p == "trace.pcap"));

        let mut cli = Cli::try_parse_from(["novelscan", "--synthetic", "0"]).unwrap();
        assert!(matches!(cli.source(), Some(Source::Synthetic(0))));

        cli.synthetic = None;
        assert!(cli.source().is_none());
    }
}
