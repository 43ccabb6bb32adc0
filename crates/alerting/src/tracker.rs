//! Progressive Severe-Alert Tracker
//!
//! Turns a stream of alert snapshots into "play a sound now" decisions.
//! An episode starts with a silent grace period, then escalates to a
//! sound every 2s and finally every 1s while critical alerts persist.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::event::AlertEvent;
use crate::TrackerError;

/// Escalation phase of the current alert episode
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EscalationPhase {
    /// No active episode
    #[default]
    Idle,
    /// Episode started, sound suppressed
    Grace,
    /// Sound at the initial urgency interval
    InitialUrgency,
    /// Sound at the maximum urgency interval
    MaxUrgency,
}

impl EscalationPhase {
    /// Ordinal for status display (0-3)
    pub fn ordinal(&self) -> u8 {
        match self {
            EscalationPhase::Idle => 0,
            EscalationPhase::Grace => 1,
            EscalationPhase::InitialUrgency => 2,
            EscalationPhase::MaxUrgency => 3,
        }
    }

    /// Human-readable label for the status readout
    pub fn description(&self) -> &'static str {
        match self {
            EscalationPhase::Idle => "Idle",
            EscalationPhase::Grace => "Grace Period",
            EscalationPhase::InitialUrgency => "Initial Urgency",
            EscalationPhase::MaxUrgency => "Maximum Urgency",
        }
    }

    /// Whether sounds may be emitted in this phase
    pub fn is_audible(&self) -> bool {
        matches!(
            self,
            EscalationPhase::InitialUrgency | EscalationPhase::MaxUrgency
        )
    }
}

impl fmt::Display for EscalationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EscalationPhase::Idle => "idle",
            EscalationPhase::Grace => "grace period",
            EscalationPhase::InitialUrgency => "initial urgency",
            EscalationPhase::MaxUrgency => "maximum urgency",
        };
        f.write_str(name)
    }
}

/// Receiver of "play sound now" requests.
///
/// Implementations must not block and must not fail: playback errors
/// are the implementor's concern.
pub trait SoundTrigger {
    fn trigger(&self);
}

impl<T: SoundTrigger + ?Sized> SoundTrigger for Arc<T> {
    fn trigger(&self) {
        (**self).trigger()
    }
}

/// Trigger that discards every request
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundTrigger for Silent {
    fn trigger(&self) {}
}

/// Tracker timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Silent period at the start of an episode (default: 5000)
    pub grace_period_ms: u64,
    /// Length of the initial urgency phase (default: 5000)
    pub initial_urgency_ms: u64,
    /// Minimum gap between sounds during initial urgency (default: 2000)
    pub initial_urgency_interval_ms: u64,
    /// Minimum gap between sounds during maximum urgency (default: 1000)
    pub max_urgency_interval_ms: u64,
    /// Episode ends after this long without a critical alert (default: 3000)
    pub alert_gap_reset_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 5000,
            initial_urgency_ms: 5000,
            initial_urgency_interval_ms: 2000,
            max_urgency_interval_ms: 1000,
            alert_gap_reset_ms: 3000,
        }
    }
}

impl TrackerConfig {
    /// Reject configurations that would sound on every frame or never reset
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.initial_urgency_interval_ms == 0 || self.max_urgency_interval_ms == 0 {
            return Err(TrackerError::InvalidConfig(
                "sound intervals must be greater than zero".into(),
            ));
        }
        if self.alert_gap_reset_ms == 0 {
            return Err(TrackerError::InvalidConfig(
                "alert_gap_reset_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Episode age at which maximum urgency begins
    pub fn max_urgency_after(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms.saturating_add(self.initial_urgency_ms))
    }

    pub fn alert_gap_reset(&self) -> Duration {
        Duration::from_millis(self.alert_gap_reset_ms)
    }

    /// Minimum time between sounds in `phase`, if the phase is audible
    pub fn interval(&self, phase: EscalationPhase) -> Option<Duration> {
        match phase {
            EscalationPhase::InitialUrgency => {
                Some(Duration::from_millis(self.initial_urgency_interval_ms))
            }
            EscalationPhase::MaxUrgency => {
                Some(Duration::from_millis(self.max_urgency_interval_ms))
            }
            EscalationPhase::Idle | EscalationPhase::Grace => None,
        }
    }
}

/// Severe-alert sound escalation state machine.
///
/// Owned by one monitoring session and fed snapshots in arrival order.
/// All timing is derived from the `now` passed to each call, so the
/// tracker owns no timers.
pub struct SevereAlertTracker<S = Silent> {
    /// Configuration
    config: TrackerConfig,
    /// Sound side effect
    sound: S,
    /// Start of the current episode
    first_alert_time: Option<Instant>,
    /// Last time a critical alert was observed
    last_alert_time: Option<Instant>,
    /// Last time a sound was requested
    last_sound_played: Option<Instant>,
    /// Current phase
    current_phase: EscalationPhase,
}

impl<S: SoundTrigger> SevereAlertTracker<S> {
    /// Create a tracker with the default timings
    pub fn new(sound: S) -> Self {
        Self::build(TrackerConfig::default(), sound)
    }

    /// Create a tracker with custom timings
    pub fn with_config(config: TrackerConfig, sound: S) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self::build(config, sound))
    }

    fn build(config: TrackerConfig, sound: S) -> Self {
        debug!("Creating severe alert tracker with config: {:?}", config);
        Self {
            config,
            sound,
            first_alert_time: None,
            last_alert_time: None,
            last_sound_played: None,
            current_phase: EscalationPhase::Idle,
        }
    }

    /// Process the current alert snapshot.
    ///
    /// Returns `true` exactly when a sound was requested from the trigger.
    pub fn process_alerts(&mut self, alerts: &[AlertEvent], now: Instant) -> bool {
        let critical = alerts.iter().filter(|alert| alert.is_critical()).count();
        let has_critical = critical > 0;

        if !has_critical && self.gap_expired(now) {
            self.reset_episode();
        }

        if has_critical {
            self.last_alert_time = Some(now);

            if self.first_alert_time.is_none() {
                self.first_alert_time = Some(now);
                self.current_phase = EscalationPhase::Grace;
                info!("Critical alert episode started, entering grace period");
            }
        }

        self.update_phase(now);

        let should_sound = has_critical && self.cooldown_expired(now);
        let episode_ms = u64::try_from(self.time_since_first_alert(now).as_millis())
            .unwrap_or(u64::MAX);

        debug!(
            critical,
            phase = %self.current_phase,
            episode_ms,
            should_sound,
            "Processed alert snapshot"
        );

        if should_sound {
            info!("Triggering sound alert ({})", self.current_phase);
            self.last_sound_played = Some(now);
            self.sound.trigger();
        }

        should_sound
    }

    fn gap_expired(&self, now: Instant) -> bool {
        match self.last_alert_time {
            Some(last) => now.saturating_duration_since(last) > self.config.alert_gap_reset(),
            None => true,
        }
    }

    fn reset_episode(&mut self) {
        if self.current_phase != EscalationPhase::Idle {
            info!(
                "Resetting alert tracking: no critical alerts for {}ms",
                self.config.alert_gap_reset_ms
            );
        }
        self.first_alert_time = None;
        self.last_alert_time = None;
        self.current_phase = EscalationPhase::Idle;
    }

    fn update_phase(&mut self, now: Instant) {
        let Some(first) = self.first_alert_time else {
            self.current_phase = EscalationPhase::Idle;
            return;
        };

        let elapsed = now.saturating_duration_since(first);
        let phase = if elapsed < self.config.grace_period() {
            EscalationPhase::Grace
        } else if elapsed < self.config.max_urgency_after() {
            EscalationPhase::InitialUrgency
        } else {
            EscalationPhase::MaxUrgency
        };

        if phase != self.current_phase {
            debug!("Phase transition: {} -> {}", self.current_phase, phase);
            self.current_phase = phase;
        }
    }

    /// False outside the audible phases
    fn cooldown_expired(&self, now: Instant) -> bool {
        let Some(interval) = self.config.interval(self.current_phase) else {
            return false;
        };
        match self.last_sound_played {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        }
    }

    /// Force the tracker back to idle (session restart)
    pub fn reset(&mut self) {
        self.reset_episode();
        self.last_sound_played = None;
    }

    pub fn current_phase(&self) -> EscalationPhase {
        self.current_phase
    }

    /// Phase ordinal (0-3) for display; not a count of alerts
    pub fn current_alert_count(&self) -> u8 {
        self.current_phase.ordinal()
    }

    pub fn phase_description(&self) -> &'static str {
        self.current_phase.description()
    }

    /// Time until the next sound may play; zero outside audible phases
    pub fn remaining_cooldown(&self, now: Instant) -> Duration {
        let Some(interval) = self.config.interval(self.current_phase) else {
            return Duration::ZERO;
        };
        match self.time_since_last_sound(now) {
            Some(since) => interval.saturating_sub(since),
            None => Duration::ZERO,
        }
    }

    /// Time since the last requested sound, if any
    pub fn time_since_last_sound(&self, now: Instant) -> Option<Duration> {
        self.last_sound_played
            .map(|last| now.saturating_duration_since(last))
    }

    /// Age of the current episode; zero when idle
    pub fn time_since_first_alert(&self, now: Instant) -> Duration {
        self.first_alert_time
            .map(|first| now.saturating_duration_since(first))
            .unwrap_or(Duration::ZERO)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Sound trigger this tracker reports to
    pub fn sound(&self) -> &S {
        &self.sound
    }
}

impl Default for SevereAlertTracker<Silent> {
    fn default() -> Self {
        Self::new(Silent)
    }
}
