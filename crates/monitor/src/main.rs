//! Driver Alert Monitor - Main Entry Point
//!
//! Reads newline-delimited JSON detection snapshots from stdin, drives
//! the severe-alert tracker in real time and prints one status line per
//! snapshot on stdout.

use std::path::PathBuf;

use alerting::SevereAlertTracker;
use clap::Parser;
use monitor::{forward_snapshots, init_logging, run, MonitorSettings, MonitoringSession};
use sound_alert::SoundAlertService;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "dms-monitor",
    version,
    about = "Severe-alert sound escalation monitor"
)]
struct Cli {
    /// Settings file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with alert audio muted
    #[arg(long)]
    mute: bool,

    /// Override playback volume (0.0-1.0)
    #[arg(long)]
    volume: Option<f32>,
}

#[cfg(feature = "rodio")]
fn audio_backend() -> sound_alert::RodioBackend {
    sound_alert::RodioBackend::new()
}

#[cfg(not(feature = "rodio"))]
fn audio_backend() -> sound_alert::NullBackend {
    sound_alert::NullBackend
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = MonitorSettings::load(cli.config.as_deref())?;
    init_logging(&settings.log_level, settings.json_logs);

    info!(
        "=== Driver Alert Monitor v{} ===",
        env!("CARGO_PKG_VERSION")
    );

    let clip_path = settings.sound.clip_path.as_deref();
    let sound = SoundAlertService::from_clip_path(audio_backend(), clip_path);
    sound.set_enabled(settings.sound.enabled && !cli.mute);
    sound.set_volume(cli.volume.unwrap_or(settings.sound.volume));
    if sound.is_audio_enabled() && !sound.request_audio_permission().await {
        warn!("Audio output could not be unlocked; alerts fall back to the synthesized tone");
    }

    let tracker = SevereAlertTracker::with_config(settings.tracker.clone(), sound)?;
    let session = MonitoringSession::new(tracker);

    let (snapshot_tx, snapshot_rx) = mpsc::channel(64);
    let (status_tx, mut status_rx) = mpsc::channel(64);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let shutdown = async move {
        let _ = shutdown_rx.await;
    };
    let monitor = tokio::spawn(run(session, snapshot_rx, status_tx, shutdown));

    // Blocking stdin reads stay off the runtime; the thread is not joined on exit
    std::thread::Builder::new()
        .name("snapshot-reader".into())
        .spawn(move || {
            if let Err(e) = forward_snapshots(std::io::stdin().lock(), snapshot_tx) {
                warn!("Snapshot input failed: {}", e);
            }
        })?;

    let print_statuses = async {
        while let Some(status) = status_rx.recv().await {
            println!("{}", serde_json::to_string(&status)?);
        }
        Ok::<_, anyhow::Error>(())
    };

    tokio::select! {
        result = print_statuses => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping monitoring"),
    }

    let _ = shutdown_tx.send(());
    drop(status_rx);
    monitor.await?;

    Ok(())
}
