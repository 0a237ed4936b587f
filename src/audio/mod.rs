pub mod features;
pub mod loader;
pub mod resampler;
pub mod stats;
pub mod synth;

use std::path::PathBuf;
use thiserror::Error;

pub use features::normalize_waveform;
pub use loader::{load_wav, mix_to_mono, LoadedAudio};
pub use resampler::{resample_to_target, AudioResampler, TARGET_SAMPLE_RATE};
pub use stats::SignalStats;
pub use synth::{write_wav, ToneProfile};

/// Errors from reading, writing or converting audio
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Audio file contains no samples: {0:?}")]
    Empty(PathBuf),

    #[error("Unsupported audio format: {0}")]
    InvalidFormat(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Resampling failed: {0}")]
    Resample(String),
}
