//! Synthetic test signals.
//!
//! Crude imitations of emotional prosody (pitch movement, decay, noise) used
//! to sanity-check the model end to end without real recordings. They are not
//! expected to be classified "correctly".

use hound::{SampleFormat, WavSpec, WavWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;
use tracing::info;

use super::AudioError;

/// Kind of synthetic signal to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneProfile {
    /// 440 Hz carrier with 5 Hz vibrato and two harmonics
    Happy,
    /// Low 220 Hz tone with an exponential decay
    Sad,
    /// Loud 330 Hz tone with noise and fast tremolo
    Angry,
    /// Steady 330 Hz tone
    Neutral,
    /// Near-silent gaussian noise (std 0.001)
    Noise,
    /// Full-scale 440 Hz sine
    Sine,
}

impl ToneProfile {
    pub const ALL: [ToneProfile; 6] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Neutral,
        Self::Noise,
        Self::Sine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Neutral => "neutral",
            Self::Noise => "noise",
            Self::Sine => "sine",
        }
    }

    /// Generate `duration_secs` of audio. The seed only affects profiles
    /// with a noise component.
    pub fn generate(&self, duration_secs: f32, sample_rate: u32, seed: u64) -> Vec<f32> {
        let n = (duration_secs.max(0.0) * sample_rate as f32) as usize;
        let mut rng = StdRng::seed_from_u64(seed);
        let sr = sample_rate as f32;

        let raw: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / sr;
                match self {
                    Self::Happy => {
                        // instantaneous frequency 440 + 100 sin(2π·5t)
                        let freq = 440.0 + 100.0 * (2.0 * PI * 5.0 * t).sin();
                        0.3 * (2.0 * PI * freq * t).sin()
                            + 0.1 * (2.0 * PI * 880.0 * t).sin()
                            + 0.05 * (2.0 * PI * 1320.0 * t).sin()
                    }
                    Self::Sad => 0.3 * (2.0 * PI * 220.0 * t).sin() * (-0.3 * t).exp(),
                    Self::Angry => {
                        let tone = 0.4 * (2.0 * PI * 330.0 * t).sin();
                        let noise = 0.1 * gaussian(&mut rng, 0.1);
                        (tone + noise) * (1.0 + 0.3 * (2.0 * PI * 10.0 * t).sin())
                    }
                    Self::Neutral => 0.3 * (2.0 * PI * 330.0 * t).sin(),
                    Self::Noise => gaussian(&mut rng, 0.001),
                    Self::Sine => (2.0 * PI * 440.0 * t).sin(),
                }
            })
            .collect();

        match self {
            Self::Noise | Self::Sine => raw,
            _ => raw
                .into_iter()
                .enumerate()
                .map(|(i, s)| {
                    let t = i as f32 / sr;
                    let am = 1.0 + 0.2 * (2.0 * PI * 3.0 * t).sin();
                    (s * am).clamp(-0.9, 0.9)
                })
                .collect(),
        }
    }
}

impl std::str::FromStr for ToneProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|p| p.as_str() == s.to_lowercase())
            .copied()
            .ok_or_else(|| format!("Unknown tone profile: {}", s))
    }
}

/// Sample from N(0, std²)
fn gaussian(rng: &mut StdRng, std: f32) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    z * std
}

/// Write mono 32-bit float WAV
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;

    info!(
        "Wrote {:?} ({} samples, {:.2}s)",
        path,
        samples.len(),
        samples.len() as f32 / sample_rate as f32
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::load_wav;
    use tempfile::tempdir;

    #[test]
    fn test_generate_length() {
        for profile in ToneProfile::ALL {
            let audio = profile.generate(1.5, 16000, 7);
            assert_eq!(audio.len(), 24000, "profile {}", profile.as_str());
        }
    }

    #[test]
    fn test_shaped_profiles_are_clipped() {
        for profile in [ToneProfile::Happy, ToneProfile::Sad, ToneProfile::Angry, ToneProfile::Neutral] {
            let audio = profile.generate(3.0, 16000, 1);
            assert!(audio.iter().all(|s| s.abs() <= 0.9));
        }
    }

    #[test]
    fn test_sad_decays() {
        let audio = ToneProfile::Sad.generate(3.0, 16000, 0);
        let first = audio[..16000].iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        let last = audio[32000..].iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        assert!(last < first, "expected decay: first {} last {}", first, last);
    }

    #[test]
    fn test_noise_is_quiet_and_seeded() {
        let a = ToneProfile::Noise.generate(1.0, 16000, 42);
        let b = ToneProfile::Noise.generate(1.0, 16000, 42);
        let c = ToneProfile::Noise.generate(1.0, 16000, 43);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let rms = (a.iter().map(|s| s * s).sum::<f32>() / a.len() as f32).sqrt();
        assert!(rms > 0.0005 && rms < 0.002, "rms {}", rms);
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!("Angry".parse::<ToneProfile>().unwrap(), ToneProfile::Angry);
        assert!("excited".parse::<ToneProfile>().is_err());
    }

    #[test]
    fn test_written_tone_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("happy.wav");
        let audio = ToneProfile::Happy.generate(1.0, 16000, 0);
        write_wav(&path, &audio, 16000).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.samples.len(), audio.len());
        assert!((loaded.samples[100] - audio[100]).abs() < 1e-6);
    }
}
