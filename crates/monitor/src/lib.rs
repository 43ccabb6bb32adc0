//! Driver Alert Monitor
//!
//! Drives a monitoring session: detection snapshots come in, the severe
//! alert tracker decides when to sound, and a status readout goes out.

pub mod session;
pub mod settings;

pub use session::{run, MonitoringSession, SessionStatus};
pub use settings::{MonitorSettings, SettingsError, SoundSettings};

use alerting::DetectionSnapshot;
use std::io::BufRead;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Malformed snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode one JSON detection update
pub fn parse_snapshot_line(line: &str) -> Result<DetectionSnapshot, MonitorError> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Forward newline-delimited snapshots from a blocking reader.
///
/// Blank lines are ignored; malformed lines are logged and skipped.
/// Returns the number of snapshots forwarded, stopping early once the
/// receiver is gone. Runs on a plain thread, never inside the runtime.
pub fn forward_snapshots<R: BufRead>(
    reader: R,
    tx: mpsc::Sender<DetectionSnapshot>,
) -> Result<usize, MonitorError> {
    let mut forwarded = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_snapshot_line(&line) {
            Ok(snapshot) => {
                if tx.blocking_send(snapshot).is_err() {
                    debug!("Snapshot receiver closed, stopping input");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => warn!("Skipping snapshot: {}", e),
        }
    }
    Ok(forwarded)
}

/// Initialize logging to stderr (stdout carries the status stream)
pub fn init_logging(level: &str, json: bool) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}
