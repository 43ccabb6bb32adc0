//! Synthesized fallback tone

use std::f32::consts::TAU;
use std::time::Duration;

/// Short sine beep with a linear attack/decay envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    /// Tone frequency in Hz
    pub frequency_hz: f32,
    /// Ramp from silence to peak gain
    pub attack: Duration,
    /// Total length; gain reaches zero at the end
    pub duration: Duration,
    /// Gain at the end of the attack
    pub peak_gain: f32,
}

impl Tone {
    pub const FREQUENCY_HZ: f32 = 800.0;
    pub const ATTACK: Duration = Duration::from_millis(10);
    pub const DURATION: Duration = Duration::from_millis(300);
    /// Fraction of the service volume used as peak gain
    pub const GAIN_SCALE: f32 = 0.3;

    /// Standard alert beep at the given volume (0.0-1.0)
    pub fn alert(volume: f32) -> Self {
        Self {
            frequency_hz: Self::FREQUENCY_HZ,
            attack: Self::ATTACK,
            duration: Self::DURATION,
            peak_gain: volume.clamp(0.0, 1.0) * Self::GAIN_SCALE,
        }
    }

    /// Envelope gain at offset `t` from the start of the tone
    pub fn envelope(&self, t: Duration) -> f32 {
        if t >= self.duration {
            return 0.0;
        }
        if t < self.attack {
            return self.peak_gain * t.as_secs_f32() / self.attack.as_secs_f32();
        }
        let decay = self.duration - self.attack;
        if decay.is_zero() {
            return 0.0;
        }
        let into_decay = (t - self.attack).as_secs_f32() / decay.as_secs_f32();
        self.peak_gain * (1.0 - into_decay)
    }

    /// Render mono f32 PCM
    pub fn samples(&self, sample_rate: u32) -> Vec<f32> {
        let count = (self.duration.as_secs_f64() * sample_rate as f64).round() as usize;
        (0..count)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                let gain = self.envelope(Duration::from_secs_f64(t));
                gain * (TAU * self.frequency_hz * t as f32).sin()
            })
            .collect()
    }
}
