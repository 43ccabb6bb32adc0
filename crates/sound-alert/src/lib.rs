//! Sound Alert Service
//!
//! Plays the pre-loaded alert clip when the severe-alert tracker asks
//! for it, falling back to a synthesized tone. Playback is best-effort:
//! failures are logged and never reach the caller.

mod backend;
mod clip;
mod service;
mod tone;

pub use backend::{AudioBackend, NullBackend};
#[cfg(feature = "rodio")]
pub use backend::RodioBackend;
pub use clip::AlertClip;
pub use service::SoundAlertService;
pub use tone::Tone;

use thiserror::Error;

/// Sound playback error types
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("Failed to load alert clip: {0}")]
    ClipLoad(#[from] std::io::Error),

    #[error("Invalid alert clip: {0}")]
    InvalidClip(String),

    #[error("No audio output device: {0}")]
    NoOutputDevice(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Playback task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
