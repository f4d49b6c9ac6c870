use anyhow::Context;
use hound::{SampleFormat, WavReader};

/// Interleaved samples decoded from a WAV file, normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Reads every sample of a RIFF WAVE stream with integer (8/16/24/32-bit) or
/// 32-bit float samples.
pub fn decode<R: std::io::Read>(reader: WavReader<R>) -> anyhow::Result<DecodedAudio> {
    let spec = reader.spec();
    tracing::debug!(
        "wav: {} Hz, {} channel(s), {} bit {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read float samples")?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read integer samples")?
        }
        (format, bits) => anyhow::bail!("unsupported sample format: {:?} {} bit", format, bits),
    };

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}
