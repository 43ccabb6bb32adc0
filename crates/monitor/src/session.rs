//! Monitoring session

use alerting::{DetectionSnapshot, EscalationPhase, SevereAlertTracker, SoundTrigger};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// How long the "sound triggered" indicator stays lit after a trigger
pub const INDICATOR_HOLD: Duration = Duration::from_secs(2);

/// Status readout after each processed snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub phase: EscalationPhase,
    /// 0-3, for compact display
    pub phase_ordinal: u8,
    pub phase_label: &'static str,
    /// A sound was requested for this snapshot
    pub sound_triggered: bool,
    /// Within the indicator hold time of the last trigger
    pub indicator_active: bool,
    pub remaining_cooldown_ms: u64,
    pub time_in_episode_ms: u64,
    /// Critical alerts in this snapshot
    pub critical_alerts: usize,
}

/// One monitoring session, from "start monitoring" until stop
pub struct MonitoringSession<S: SoundTrigger> {
    tracker: SevereAlertTracker<S>,
    last_trigger: Option<Instant>,
    snapshots: u64,
}

impl<S: SoundTrigger> MonitoringSession<S> {
    pub fn new(tracker: SevereAlertTracker<S>) -> Self {
        info!("Monitoring session started");
        Self {
            tracker,
            last_trigger: None,
            snapshots: 0,
        }
    }

    /// Feed one snapshot through the tracker
    pub fn handle_snapshot(&mut self, snapshot: &DetectionSnapshot, now: Instant) -> SessionStatus {
        self.snapshots += 1;
        let sound_triggered = self.tracker.process_alerts(&snapshot.alerts, now);
        if sound_triggered {
            self.last_trigger = Some(now);
        }

        self.status(now, sound_triggered, snapshot.critical_alerts().count())
    }

    fn status(&self, now: Instant, sound_triggered: bool, critical_alerts: usize) -> SessionStatus {
        let phase = self.tracker.current_phase();
        let indicator_active = self
            .last_trigger
            .map(|at| now.saturating_duration_since(at) < INDICATOR_HOLD)
            .unwrap_or(false);

        SessionStatus {
            phase,
            phase_ordinal: phase.ordinal(),
            phase_label: phase.description(),
            sound_triggered,
            indicator_active,
            remaining_cooldown_ms: millis(self.tracker.remaining_cooldown(now)),
            time_in_episode_ms: millis(self.tracker.time_since_first_alert(now)),
            critical_alerts,
        }
    }

    /// Stop monitoring; the tracker returns to idle
    pub fn stop(&mut self) {
        self.tracker.reset();
        self.last_trigger = None;
        info!(
            "Monitoring session stopped after {} snapshots",
            self.snapshots
        );
    }

    pub fn tracker(&self) -> &SevereAlertTracker<S> {
        &self.tracker
    }

    /// Snapshots processed so far
    pub fn snapshot_count(&self) -> u64 {
        self.snapshots
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Process snapshots in arrival order until the input closes or
/// `shutdown` completes.
///
/// Each status is forwarded to `statuses`; the session is stopped and
/// handed back once the loop ends.
pub async fn run<S, F>(
    mut session: MonitoringSession<S>,
    mut snapshots: mpsc::Receiver<DetectionSnapshot>,
    statuses: mpsc::Sender<SessionStatus>,
    shutdown: F,
) -> MonitoringSession<S>
where
    S: SoundTrigger,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let snapshot = tokio::select! {
            snapshot = snapshots.recv() => match snapshot {
                Some(snapshot) => snapshot,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown requested, ending session");
                break;
            }
        };

        let now = tokio::time::Instant::now().into_std();
        let status = session.handle_snapshot(&snapshot, now);
        if statuses.send(status).await.is_err() {
            debug!("Status receiver dropped, ending session");
            break;
        }
    }

    session.stop();
    session
}
