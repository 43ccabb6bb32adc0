//! Audio output backends

use async_trait::async_trait;

use crate::clip::AlertClip;
use crate::tone::Tone;
use crate::SoundError;

/// Audio output port used by the sound alert service
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Play the clip from the beginning at `volume` (0.0-1.0)
    async fn play_clip(&self, clip: &AlertClip, volume: f32) -> Result<(), SoundError>;

    /// Play a synthesized tone
    async fn play_tone(&self, tone: &Tone) -> Result<(), SoundError>;

    /// Open the output once without audible playback, so later plays are not blocked
    async fn unlock(&self, clip: &AlertClip) -> Result<(), SoundError>;
}

/// Backend for builds without audio output support
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

#[async_trait]
impl AudioBackend for NullBackend {
    async fn play_clip(&self, _clip: &AlertClip, _volume: f32) -> Result<(), SoundError> {
        Err(SoundError::NoOutputDevice("audio output not compiled in".into()))
    }

    async fn play_tone(&self, _tone: &Tone) -> Result<(), SoundError> {
        Err(SoundError::NoOutputDevice("audio output not compiled in".into()))
    }

    async fn unlock(&self, _clip: &AlertClip) -> Result<(), SoundError> {
        Err(SoundError::NoOutputDevice("audio output not compiled in".into()))
    }
}

#[cfg(feature = "rodio")]
pub use self::rodio_backend::RodioBackend;

#[cfg(feature = "rodio")]
mod rodio_backend {
    use super::*;
    use rodio::buffer::SamplesBuffer;
    use rodio::{Decoder, OutputStream, Sink};
    use std::io::Cursor;
    use tracing::debug;

    /// Default-device output through rodio.
    ///
    /// Each request opens its own stream on a blocking task, so
    /// overlapping requests play independently from the start.
    #[derive(Debug, Clone)]
    pub struct RodioBackend {
        sample_rate: u32,
    }

    impl RodioBackend {
        pub fn new() -> Self {
            Self {
                sample_rate: 44_100,
            }
        }
    }

    impl Default for RodioBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    fn open_sink() -> Result<(OutputStream, Sink), SoundError> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| SoundError::NoOutputDevice(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| SoundError::Playback(e.to_string()))?;
        Ok((stream, sink))
    }

    fn decode(clip: &AlertClip) -> Result<Decoder<Cursor<std::sync::Arc<[u8]>>>, SoundError> {
        Decoder::new(Cursor::new(clip.bytes())).map_err(|e| SoundError::InvalidClip(e.to_string()))
    }

    #[async_trait]
    impl AudioBackend for RodioBackend {
        async fn play_clip(&self, clip: &AlertClip, volume: f32) -> Result<(), SoundError> {
            let clip = clip.clone();
            tokio::task::spawn_blocking(move || -> Result<(), SoundError> {
                let source = decode(&clip)?;
                let (_stream, sink) = open_sink()?;
                sink.set_volume(volume);
                sink.append(source);
                sink.sleep_until_end();
                debug!("Alert clip finished");
                Ok(())
            })
            .await?
        }

        async fn play_tone(&self, tone: &Tone) -> Result<(), SoundError> {
            let samples = tone.samples(self.sample_rate);
            let sample_rate = self.sample_rate;
            tokio::task::spawn_blocking(move || -> Result<(), SoundError> {
                let (_stream, sink) = open_sink()?;
                sink.append(SamplesBuffer::new(1, sample_rate, samples));
                sink.sleep_until_end();
                debug!("Fallback tone finished");
                Ok(())
            })
            .await?
        }

        async fn unlock(&self, clip: &AlertClip) -> Result<(), SoundError> {
            let clip = clip.clone();
            tokio::task::spawn_blocking(move || -> Result<(), SoundError> {
                let source = decode(&clip)?;
                let (_stream, sink) = open_sink()?;
                sink.pause();
                sink.append(source);
                sink.stop();
                Ok(())
            })
            .await?
        }
    }
}
