//! Model-side collaborators of the decision rule.
//!
//! The decision rule only ever sees three scores; everything that produces or
//! inspects them lives here: the inference trait and its ONNX provider, head
//! weight inspection, load-path consistency checks and downloads.

pub mod consistency;
pub mod download;
pub mod head;
mod provider;

use std::path::PathBuf;
use thiserror::Error;

use crate::emotion::EmotionScores;

pub use consistency::{check_consistency, compare_outputs, probe_signal, OutputComparison};
pub use download::{download_file, ensure_model, probe_url, DownloadError, DownloadReport, UrlProbe};
pub use head::{inspect_head, HeadReport, DEFAULT_BIAS_KEY, DEFAULT_WEIGHT_KEY};
pub use provider::{OnnxEmotionModel, OnnxModelConfig};

/// Errors that can occur while loading, running or inspecting the model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Expected 3 outputs from the emotion head, got {0}")]
    OutputShape(usize),

    #[error("Invalid weights file: {0}")]
    Format(String),

    #[error("Tensor not found: {0}")]
    MissingTensor(String),

    #[error("Tensor {name} has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("Unexpected head shape: {0}")]
    HeadShape(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feature not enabled (rebuild with --features onnx)")]
    FeatureNotEnabled,
}

/// Opaque inference step: 16kHz mono waveform in, raw (ang, hap, sad) out
pub trait EmotionInference {
    fn infer(&mut self, audio: &[f32]) -> Result<EmotionScores, ModelError>;
}

/// Inference double that returns the same scores for any input.
///
/// Useful for exercising the decision path without model weights.
#[derive(Debug, Clone)]
pub struct FixedScores {
    scores: EmotionScores,
    calls: usize,
}

impl FixedScores {
    pub fn new(scores: EmotionScores) -> Self {
        Self { scores, calls: 0 }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl EmotionInference for FixedScores {
    fn infer(&mut self, audio: &[f32]) -> Result<EmotionScores, ModelError> {
        if audio.is_empty() {
            return Err(ModelError::InvalidInput("empty audio".to_string()));
        }
        self.calls += 1;
        Ok(self.scores)
    }
}
