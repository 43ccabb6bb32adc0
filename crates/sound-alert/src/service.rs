//! Sound alert service

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use alerting::SoundTrigger;

use crate::backend::AudioBackend;
use crate::clip::AlertClip;
use crate::tone::Tone;

const DEFAULT_VOLUME: f32 = 0.7;

struct Inner {
    backend: Box<dyn AudioBackend>,
    clip: Option<AlertClip>,
    enabled: AtomicBool,
    /// f32 bits
    volume: AtomicU32,
}

/// Best-effort alert sound player.
///
/// Cloning is cheap and clones share mute and volume settings.
#[derive(Clone)]
pub struct SoundAlertService {
    inner: Arc<Inner>,
}

impl SoundAlertService {
    /// Create a service with an already loaded clip (or none)
    pub fn new(backend: impl AudioBackend + 'static, clip: Option<AlertClip>) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend: Box::new(backend),
                clip,
                enabled: AtomicBool::new(true),
                volume: AtomicU32::new(DEFAULT_VOLUME.to_bits()),
            }),
        }
    }

    /// Create a service, loading the clip from `clip_path`.
    ///
    /// A clip that cannot be loaded leaves the service on the tone fallback.
    pub fn from_clip_path(backend: impl AudioBackend + 'static, clip_path: Option<&Path>) -> Self {
        let clip = clip_path.and_then(|path| match AlertClip::load(path) {
            Ok(clip) => Some(clip),
            Err(e) => {
                warn!(
                    "Alert clip {} failed to load, using fallback tone: {}",
                    path.display(),
                    e
                );
                None
            }
        });
        Self::new(backend, clip)
    }

    /// Play the alert clip, or the fallback tone if it is unavailable or fails
    pub async fn play_alert_sound(&self) {
        if !self.is_audio_enabled() {
            debug!("Audio disabled, skipping alert sound");
            return;
        }

        let volume = self.volume();

        if let Some(clip) = &self.inner.clip {
            match self.inner.backend.play_clip(clip, volume).await {
                Ok(()) => {
                    debug!("Alert clip played");
                    return;
                }
                Err(e) => warn!("Failed to play alert clip, using fallback tone: {}", e),
            }
        } else {
            debug!("No alert clip loaded, using fallback tone");
        }

        if let Err(e) = self.inner.backend.play_tone(&Tone::alert(volume)).await {
            warn!("Failed to play fallback tone: {}", e);
        }
    }

    /// Unlock audio output ahead of the first alert
    pub async fn request_audio_permission(&self) -> bool {
        let Some(clip) = &self.inner.clip else {
            return true;
        };
        match self.inner.backend.unlock(clip).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Audio permission not granted: {}", e);
                false
            }
        }
    }

    /// Master mute switch
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
        info!(
            "Alert audio {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    pub fn is_audio_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    /// Set playback volume, clamped to 0.0-1.0
    pub fn set_volume(&self, volume: f32) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.inner.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.inner.volume.load(Ordering::Relaxed))
    }

    /// Whether a primary clip is loaded
    pub fn has_clip(&self) -> bool {
        self.inner.clip.is_some()
    }
}

impl SoundTrigger for SoundAlertService {
    /// Fire-and-forget playback on the current tokio runtime
    fn trigger(&self) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let service = self.clone();
                handle.spawn(async move { service.play_alert_sound().await });
            }
            Err(_) => warn!("No async runtime available, dropping alert sound"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::wav_header;
    use crate::SoundError;
    use async_trait::async_trait;
    use std::io::Write;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Clip(f32),
        Tone(f32),
        Unlock,
    }

    struct RecordingBackend {
        calls: mpsc::UnboundedSender<Call>,
        clip_fails: bool,
        tone_fails: bool,
    }

    impl RecordingBackend {
        fn new(clip_fails: bool, tone_fails: bool) -> (Self, mpsc::UnboundedReceiver<Call>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Self {
                    calls: tx,
                    clip_fails,
                    tone_fails,
                },
                rx,
            )
        }
    }

    #[async_trait]
    impl AudioBackend for RecordingBackend {
        async fn play_clip(&self, _clip: &AlertClip, volume: f32) -> Result<(), SoundError> {
            let _ = self.calls.send(Call::Clip(volume));
            if self.clip_fails {
                Err(SoundError::Playback("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }

        async fn play_tone(&self, tone: &Tone) -> Result<(), SoundError> {
            let _ = self.calls.send(Call::Tone(tone.peak_gain));
            if self.tone_fails {
                Err(SoundError::NoOutputDevice("none".into()))
            } else {
                Ok(())
            }
        }

        async fn unlock(&self, _clip: &AlertClip) -> Result<(), SoundError> {
            let _ = self.calls.send(Call::Unlock);
            if self.clip_fails {
                Err(SoundError::Playback("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }
    }

    fn clip() -> Option<AlertClip> {
        Some(AlertClip::from_bytes(wav_header(16)).unwrap())
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Call>) -> Vec<Call> {
        let mut calls = Vec::new();
        while let Ok(call) = rx.try_recv() {
            calls.push(call);
        }
        calls
    }

    #[tokio::test]
    async fn test_plays_clip_at_volume() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());

        service.play_alert_sound().await;
        assert_eq!(drain(&mut rx), vec![Call::Clip(0.7)]);
    }

    #[tokio::test]
    async fn test_falls_back_to_tone_when_clip_fails() {
        let (backend, mut rx) = RecordingBackend::new(true, false);
        let service = SoundAlertService::new(backend, clip());
        service.set_volume(1.0);

        service.play_alert_sound().await;
        assert_eq!(drain(&mut rx), vec![Call::Clip(1.0), Call::Tone(0.3)]);
    }

    #[tokio::test]
    async fn test_tone_without_clip() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, None);

        service.play_alert_sound().await;
        let calls = drain(&mut rx);
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], Call::Tone(_)));
    }

    #[tokio::test]
    async fn test_total_failure_is_swallowed() {
        let (backend, mut rx) = RecordingBackend::new(true, true);
        let service = SoundAlertService::new(backend, clip());

        service.play_alert_sound().await;
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_plays_nothing() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());

        service.set_enabled(false);
        assert!(!service.is_audio_enabled());
        service.play_alert_sound().await;
        assert!(drain(&mut rx).is_empty());

        service.set_enabled(true);
        service.play_alert_sound().await;
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_muted_service_still_advances_tracker_cooldown() {
        use alerting::{AlertEvent, AlertSeverity, EscalationPhase, SevereAlertTracker};
        use std::time::Instant;

        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());
        service.set_enabled(false);
        let mut tracker = SevereAlertTracker::new(service.clone());

        let alerts = vec![AlertEvent::new(AlertSeverity::Severe, "Eyes closed")];
        let base = Instant::now();
        let at = |ms: u64| base + Duration::from_millis(ms);

        assert!(!tracker.process_alerts(&alerts, base));
        assert!(tracker.process_alerts(&alerts, at(5000)));
        assert_eq!(tracker.current_phase(), EscalationPhase::InitialUrgency);
        assert!(!tracker.process_alerts(&alerts, at(6000)));
        assert_eq!(
            tracker.remaining_cooldown(at(6000)),
            Duration::from_millis(1000)
        );

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(drain(&mut rx).is_empty());

        // Unmuting resumes on the tracker's existing cadence
        service.set_enabled(true);
        assert!(tracker.process_alerts(&alerts, at(7000)));
        let call = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(call, Some(Call::Clip(0.7)));
    }

    #[test]
    fn test_volume_clamped() {
        let service = SoundAlertService::new(crate::NullBackend, None);
        assert!((service.volume() - 0.7).abs() < f32::EPSILON);

        service.set_volume(1.5);
        assert_eq!(service.volume(), 1.0);
        service.set_volume(-0.2);
        assert_eq!(service.volume(), 0.0);
        service.set_volume(0.25);
        assert_eq!(service.volume(), 0.25);

        // Clones share settings
        let clone = service.clone();
        clone.set_volume(0.5);
        assert_eq!(service.volume(), 0.5);
    }

    #[tokio::test]
    async fn test_request_audio_permission() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());
        assert!(service.request_audio_permission().await);
        assert_eq!(drain(&mut rx), vec![Call::Unlock]);

        let (backend, _rx) = RecordingBackend::new(true, false);
        let blocked = SoundAlertService::new(backend, clip());
        assert!(!blocked.request_audio_permission().await);

        let (backend, mut rx) = RecordingBackend::new(true, false);
        let no_clip = SoundAlertService::new(backend, None);
        assert!(no_clip.request_audio_permission().await);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_trigger_spawns_playback() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());

        service.trigger();
        let call = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap();
        assert_eq!(call, Some(Call::Clip(0.7)));
    }

    #[test]
    fn test_trigger_without_runtime_is_dropped() {
        let (backend, mut rx) = RecordingBackend::new(false, false);
        let service = SoundAlertService::new(backend, clip());

        service.trigger();
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_from_clip_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&wav_header(32)).unwrap();

        let loaded = SoundAlertService::from_clip_path(crate::NullBackend, Some(file.path()));
        assert!(loaded.has_clip());

        let missing = SoundAlertService::from_clip_path(
            crate::NullBackend,
            Some(Path::new("/nonexistent/severe-alert.wav")),
        );
        assert!(!missing.has_clip());

        let none = SoundAlertService::from_clip_path(crate::NullBackend, None);
        assert!(!none.has_clip());
    }
}
