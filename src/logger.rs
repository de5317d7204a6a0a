//! Structured logging for novelscan.
//!
//! Provides a [`Logger`] that writes events to stdout and optionally to a log
//! file, either as human-readable plain text or as newline-delimited JSON
//! (NDJSON).

use chrono::Local;
use novelscan::detect::FieldScore;
use novelscan::{DecodeError, LayeredPacket, RunSummary};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex};

// ── Event types ──────────────────────────────────────────────────────────────

/// All distinct event kinds novelscan can emit.
///
/// JSON output carries an `"event"` key naming the variant.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event<'a> {
    /// Informational startup / status message.
    Info { message: &'a str },

    /// The training window has been consumed; scoring starts with `index`.
    TrainingComplete {
        index:  u64,
        fields: usize,
        values: usize,
    },

    /// A frame failed to decode.
    Malformed {
        index: u64,
        #[serde(serialize_with = "display")]
        error: &'a DecodeError,
    },

    /// A packet crossed the anomaly threshold.
    Anomaly {
        index:  u64,
        score:  f64,
        field:  &'a str,
        value:  &'a str,
        fields: Vec<&'a FieldScore>,
    },

    /// Dump mode: one decoded packet.
    Decoded {
        index:  u64,
        packet: &'a LayeredPacket,
    },

    /// Run summary emitted at the end of the run.
    SessionSummary {
        duration_secs: u64,
        summary:       RunSummary,
    },
}

fn display<T: std::fmt::Display, S: serde::Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}

// ── Logger ───────────────────────────────────────────────────────────────────

pub struct Logger {
    /// Format events as NDJSON instead of plain text.
    json: bool,
    /// `None` when `--log-file` was not given.
    file: Option<Mutex<BufWriter<std::fs::File>>>,
}

pub type SharedLogger = Arc<Logger>;

impl Logger {
    /// Creates a logger, opening `log_path` for appending when given.
    ///
    /// # Errors
    /// Returns an `io::Error` if the log file cannot be opened or created.
    pub fn new(json: bool, log_path: Option<&str>) -> io::Result<Self> {
        let file = match log_path {
            Some(path) => {
                let f = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Mutex::new(BufWriter::new(f)))
            }
            None => None,
        };

        Ok(Self { json, file })
    }

    /// Logs a single [`Event`] to stdout and the log file.
    pub fn log(&self, event: &Event) {
        let line = self.render(event, &Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string());

        println!("{}", line);

        if let Some(mutex) = &self.file {
            if let Ok(mut writer) = mutex.lock() {
                let _ = writeln!(writer, "{}", line);
                let _ = writer.flush();
            }
        }
    }

    fn render(&self, event: &Event, timestamp: &str) -> String {
        if self.json {
            let mut val = serde_json::to_value(event).unwrap_or_default();
            if let Some(obj) = val.as_object_mut() {
                obj.insert("timestamp".to_string(), serde_json::Value::String(timestamp.to_string()));
            }
            serde_json::to_string(&val).unwrap_or_default()
        } else {
            format!("[{}] {}", timestamp, plain_text(event))
        }
    }
}

/// Formats an [`Event`] as plain text, without the timestamp.
fn plain_text(event: &Event) -> String {
    match event {
        Event::Info { message } =>
            format!("[INFO] {}", message),

        Event::TrainingComplete { index, fields, values } =>
            format!("[TRAINED] scoring from packet {} ({} fields, {} values known)", index, fields, values),

        Event::Malformed { index, error } =>
            format!("[MALFORMED] packet {}: {}", index, error),

        Event::Anomaly { index, score, field, value, fields } => {
            let mut s = format!("[ANOMALY] packet {} score {:.4} {}={}", index, score, field, value);
            for f in fields {
                s.push_str(&format!("\n    {:<14} {:<20} {:.4}", f.field, f.value, f.score));
            }
            s
        }

        Event::Decoded { index, packet } =>
            format!("[PACKET {}]\n{}", index, packet),

        Event::SessionSummary { duration_secs, summary } => format!(
            "[SUMMARY] duration={}s packets={} trained={} scored={} malformed={} anomalies={} fields={} values={}",
            duration_secs,
            summary.packets,
            summary.trained,
            summary.scored,
            summary.malformed,
            summary.anomalies,
            summary.distinct_fields,
            summary.distinct_values,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelscan::Protocol;

    #[test]
    fn json_lines_are_tagged_and_timestamped() {
        let logger = Logger::new(true, None).unwrap();
        let error = DecodeError::TruncatedHeader { protocol: Protocol::Tcp, needed: 20, available: 10 };
        let line = logger.render(&Event::Malformed { index: 7, error: &error }, "T");
        let val: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(val["event"], "malformed");
        assert_eq!(val["index"], 7);
        assert_eq!(val["timestamp"], "T");
        assert_eq!(val["error"], "truncated TCP header: need 20 bytes, have 10");
    }

    #[test]
    fn summary_is_nested() {
        let logger = Logger::new(true, None).unwrap();
        let summary = RunSummary { packets: 3, anomalies: 1, ..Default::default() };
        let line = logger.render(&Event::SessionSummary { duration_secs: 2, summary }, "T");
        let val: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(val["event"], "session_summary");
        assert_eq!(val["duration_secs"], 2);
        assert_eq!(val["summary"]["packets"], 3);
        assert_eq!(val["summary"]["anomalies"], 1);
    }

    #[test]
    fn plain_text_lists_anomalous_fields() {
        let logger = Logger::new(false, None).unwrap();
        let f = FieldScore {
            field:           "tcp_dstport".into(),
            value:           "31337".into(),
            time_score:      400.0,
            frequency_score: 400.0,
            score:           1.0,
            anomalous:       true,
        };
        let line = logger.render(
            &Event::Anomaly { index: 401, score: 1.0, field: "tcp_dstport", value: "31337", fields: vec![&f] },
            "T",
        );
        assert!(line.starts_with("[T] [ANOMALY] packet 401 score 1.0000 tcp_dstport=31337"));
        assert!(line.contains("31337"));
        assert_eq!(line.lines().count(), 2);
    }
}
