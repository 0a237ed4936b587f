use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::{debug, info};

use super::resampler::{resample_to_target, TARGET_SAMPLE_RATE};
use super::AudioError;

/// A recording decoded to 16kHz mono
#[derive(Debug, Clone)]
pub struct LoadedAudio {
    pub samples: Vec<f32>,
    pub source_sample_rate: u32,
    pub source_channels: u16,
}

impl LoadedAudio {
    pub fn sample_rate(&self) -> u32 {
        TARGET_SAMPLE_RATE
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / TARGET_SAMPLE_RATE as f32
    }
}

/// Read a WAV file, mix it down to mono and resample to 16kHz
pub fn load_wav(path: &Path) -> Result<LoadedAudio, AudioError> {
    if !path.exists() {
        return Err(AudioError::NotFound(path.to_path_buf()));
    }

    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    debug!(
        "WAV {:?}: {} Hz, {} channels, {} bits {:?}",
        path, spec.sample_rate, spec.channels, spec.bits_per_sample, spec.sample_format
    );

    if spec.channels == 0 {
        return Err(AudioError::InvalidFormat("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::InvalidFormat(format!(
                    "unsupported bit depth {}",
                    spec.bits_per_sample
                )));
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    if interleaved.is_empty() {
        return Err(AudioError::Empty(path.to_path_buf()));
    }

    let mono = mix_to_mono(&interleaved, spec.channels);
    let samples = resample_to_target(&mono, spec.sample_rate)?;

    info!(
        "Loaded {:?}: {:.2}s at {} Hz ({} samples)",
        path,
        samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
        TARGET_SAMPLE_RATE,
        samples.len()
    );

    Ok(LoadedAudio {
        samples,
        source_sample_rate: spec.sample_rate,
        source_channels: spec.channels,
    })
}

/// Average interleaved frames into one channel
pub fn mix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
