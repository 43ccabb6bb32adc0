//! Alerting System
//!
//! Alert data model for detection snapshots and the progressive
//! severe-alert tracker that decides when an audible warning is due.

mod event;
mod tracker;

pub use event::{AlertEvent, AlertSeverity, DetectionSnapshot};
pub use tracker::{EscalationPhase, SevereAlertTracker, Silent, SoundTrigger, TrackerConfig};

use thiserror::Error;

/// Alerting error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Invalid tracker configuration: {0}")]
    InvalidConfig(String),
}
