//! Turns a recording on disk into the base64 `pcm16` payload the realtime API
//! accepts: 24 kHz, mono, signed 16-bit little-endian, no container header.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hound::WavReader;

use crate::types::audio::{
    Base64EncodedAudioBytes, PCM16_CHANNELS, PCM16_SAMPLE_RATE, PCM16_SAMPLE_WIDTH,
};
use crate::utils::{audio, wav};

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio file not found: {0}")]
    Missing(PathBuf),
    #[error("failed to open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("failed to resample audio: {0}")]
    Resample(String),
    #[error("{0} contains no audio frames")]
    Empty(PathBuf),
}

/// The encoded clip, ready to be attached to a conversation item.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAudio {
    encoded: Base64EncodedAudioBytes,
    samples: usize,
}

impl PreparedAudio {
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn into_encoded(self) -> Base64EncodedAudioBytes {
        self.encoded
    }

    pub fn sample_rate(&self) -> u32 {
        PCM16_SAMPLE_RATE
    }

    pub fn channels(&self) -> u16 {
        PCM16_CHANNELS
    }

    pub fn sample_width(&self) -> usize {
        PCM16_SAMPLE_WIDTH
    }

    /// Number of mono samples in the payload.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Size of the raw PCM payload before base64 encoding.
    pub fn byte_len(&self) -> usize {
        self.samples * PCM16_SAMPLE_WIDTH
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples as f64 / PCM16_SAMPLE_RATE as f64
    }
}

/// Decodes, downmixes, resamples, quantizes and base64-encodes `path`.
pub fn prepare(path: &Path) -> Result<PreparedAudio, AudioError> {
    tracing::info!("processing audio file: {}", path.display());

    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            AudioError::Missing(path.to_path_buf())
        } else {
            AudioError::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let decode_error = |reason: String| AudioError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let reader = WavReader::new(BufReader::new(file)).map_err(|e| decode_error(e.to_string()))?;
    let decoded = wav::decode(reader).map_err(|e| decode_error(format!("{e:#}")))?;
    if decoded.frames() == 0 {
        return Err(AudioError::Empty(path.to_path_buf()));
    }

    let mono = audio::downmix(&decoded.samples, decoded.channels as usize);
    let resampled = audio::resample(&mono, decoded.sample_rate, PCM16_SAMPLE_RATE)
        .map_err(|e| AudioError::Resample(format!("{e:#}")))?;
    let pcm16 = audio::convert_f32_to_i16(&resampled);
    let encoded = audio::encode_i16(&pcm16);

    tracing::info!(
        "audio processed: {:.2}s, {} Hz -> {} Hz, {} channel(s) -> 1, encoded length {}",
        decoded.duration_secs(),
        decoded.sample_rate,
        PCM16_SAMPLE_RATE,
        decoded.channels,
        encoded.len()
    );

    Ok(PreparedAudio {
        encoded,
        samples: pcm16.len(),
    })
}
