mod cli;
mod logger;
mod monitor;

use clap::Parser;
use cli::Cli;
use logger::{Event, Logger};
use monitor::{start_monitor, MonitorConfig, ShutdownFlag};
use novelscan::{DetectorConfig, RunSummary};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
    let session_start = Instant::now();

    let logger = match Logger::new(cli.json, cli.log_file.as_deref()) {
        Ok(l) => Arc::new(l),
        Err(e) => {
            eprintln!("novelscan: cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = register_shutdown_handler(Arc::clone(&shutdown)) {
        logger.log(&Event::Info {
            message: &format!("Warning: could not register Ctrl+C handler ({})", e),
        });
    }

    let Some(source) = cli.source() else {
        eprintln!("novelscan: one of --read or --synthetic is required");
        return ExitCode::FAILURE;
    };

    let cfg = MonitorConfig {
        source,
        detector: build_config(&cli),
        dump:     cli.dump,
        logger:   Arc::clone(&logger),
        shutdown: Arc::clone(&shutdown),
    };

    match start_monitor(&cfg) {
        Ok(summary) => {
            print_summary(&logger, summary, session_start);
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger.log(&Event::Info {
                message: &format!("Monitor error: {}", e),
            });
            ExitCode::FAILURE
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Registers a Ctrl+C handler that asks the replay loop to stop.
fn register_shutdown_handler(shutdown: ShutdownFlag) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        eprintln!("\n[!] Ctrl+C received, shutting down...");
        shutdown.store(true, Ordering::SeqCst);
    })
}

/// Builds detector tunables from command-line arguments.
fn build_config(cli: &Cli) -> DetectorConfig {
    DetectorConfig {
        max_training: cli.max_training,
        max_packets:  cli.max_packets,
        threshold:    cli.threshold,
        max_layers:   cli.max_layers,
    }
}

fn print_summary(logger: &Logger, summary: RunSummary, session_start: Instant) {
    logger.log(&Event::SessionSummary {
        duration_secs: session_start.elapsed().as_secs(),
        summary,
    });
}
