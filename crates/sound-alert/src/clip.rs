//! Pre-loaded alert clip

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::SoundError;

/// Encoded WAV clip kept in memory so every play restarts from the beginning
#[derive(Debug, Clone)]
pub struct AlertClip {
    bytes: Arc<[u8]>,
    source: Option<PathBuf>,
}

impl AlertClip {
    /// Load and validate a WAV file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SoundError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut clip = Self::from_bytes(bytes)?;
        clip.source = Some(path.to_path_buf());
        info!(
            "Loaded alert clip from {} ({} bytes)",
            path.display(),
            clip.len()
        );
        Ok(clip)
    }

    /// Wrap in-memory WAV data, checking the RIFF/WAVE header
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SoundError> {
        let bytes = bytes.into();
        if bytes.len() < 12 {
            return Err(SoundError::InvalidClip(format!(
                "{} bytes is too short for a WAV header",
                bytes.len()
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(SoundError::InvalidClip("missing RIFF/WAVE header".into()));
        }

        Ok(Self {
            bytes: bytes.into(),
            source: None,
        })
    }

    /// Shared handle to the encoded data
    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File the clip was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
pub(crate) fn wav_header(data_len: u32) -> Vec<u8> {
    // 16-bit mono PCM at 8kHz
    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&8000u32.to_le_bytes());
    wav.extend_from_slice(&16000u32.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_bytes_accepts_wav() {
        let clip = AlertClip::from_bytes(wav_header(160)).unwrap();
        assert_eq!(clip.len(), 204);
        assert!(clip.source().is_none());
    }

    #[test]
    fn test_rejects_non_wav() {
        let err = AlertClip::from_bytes(b"ID3\x04not a wav file".to_vec()).unwrap_err();
        assert!(matches!(err, SoundError::InvalidClip(_)));

        let err = AlertClip::from_bytes(b"RIFF".to_vec()).unwrap_err();
        assert!(matches!(err, SoundError::InvalidClip(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&wav_header(80)).unwrap();

        let clip = AlertClip::load(file.path()).unwrap();
        assert_eq!(clip.source(), Some(file.path()));
        assert_eq!(clip.bytes().len(), 124);
    }

    #[test]
    fn test_load_missing_file() {
        let err = AlertClip::load("/nonexistent/severe-alert.wav").unwrap_err();
        assert!(matches!(err, SoundError::ClipLoad(_)));
    }
}
