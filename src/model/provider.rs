//! ONNX-backed emotion encoder.
//!
//! Runs an exported encoder + linear head that maps a 16kHz waveform of shape
//! `[batch, time]` to three scores in head order (ang, hap, sad). Built only
//! with the `onnx` feature; otherwise a stub reports `FeatureNotEnabled`.

#[cfg(feature = "onnx")]
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::Value,
};
use std::path::PathBuf;

use super::{EmotionInference, ModelError};
use crate::emotion::EmotionScores;

/// Configuration for the ONNX emotion model
#[derive(Debug, Clone)]
pub struct OnnxModelConfig {
    pub model_path: PathBuf,
    /// Number of intra-op threads for ONNX inference
    pub n_threads: usize,
    /// Shortest waveform accepted (0.5s at 16kHz)
    pub min_audio_samples: usize,
    /// Apply zero-mean unit-variance normalisation before the forward pass
    pub normalize: bool,
}

impl Default for OnnxModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            n_threads: 1,
            min_audio_samples: 8000,
            normalize: true,
        }
    }
}

#[cfg(feature = "onnx")]
pub struct OnnxEmotionModel {
    session: Session,
    config: OnnxModelConfig,
}

#[cfg(feature = "onnx")]
impl OnnxEmotionModel {
    /// Whether this build can run the model
    pub fn is_available() -> bool {
        true
    }

    pub fn new(config: OnnxModelConfig) -> Result<Self, ModelError> {
        if !config.model_path.exists() {
            return Err(ModelError::NotFound(config.model_path.clone()));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| ModelError::Load(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| ModelError::Load(e.to_string()))?
            .with_intra_threads(config.n_threads)
            .map_err(|e: ort::Error| ModelError::Load(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e: ort::Error| ModelError::Load(e.to_string()))?;

        tracing::info!("Emotion model loaded from {:?}", config.model_path);

        Ok(Self { session, config })
    }

    pub fn config(&self) -> &OnnxModelConfig {
        &self.config
    }
}

#[cfg(feature = "onnx")]
impl EmotionInference for OnnxEmotionModel {
    fn infer(&mut self, audio: &[f32]) -> Result<EmotionScores, ModelError> {
        if audio.len() < self.config.min_audio_samples {
            return Err(ModelError::InvalidInput(format!(
                "audio too short: {} samples (min: {})",
                audio.len(),
                self.config.min_audio_samples
            )));
        }

        let input = if self.config.normalize {
            crate::audio::normalize_waveform(audio)
        } else {
            audio.to_vec()
        };

        let input_shape = [1_usize, input.len()];
        let input_tensor = Value::from_array((input_shape, input))
            .map_err(|e: ort::Error| ModelError::Inference(e.to_string()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e: ort::Error| ModelError::Inference(e.to_string()))?;

        let output = outputs
            .iter()
            .next()
            .ok_or_else(|| ModelError::Inference("No output from model".to_string()))?;

        let output_tensor = output
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e: ort::Error| ModelError::Inference(e.to_string()))?;

        let values: Vec<f32> = output_tensor.1.iter().copied().collect();

        let scores = EmotionScores::from_slice(&values)
            .ok_or(ModelError::OutputShape(values.len()))?;

        tracing::debug!(
            "Raw scores: ang {:.4} hap {:.4} sad {:.4}",
            scores.ang,
            scores.hap,
            scores.sad
        );

        Ok(scores)
    }
}

// Stub implementation when feature is not enabled
#[cfg(not(feature = "onnx"))]
pub struct OnnxEmotionModel;

#[cfg(not(feature = "onnx"))]
impl OnnxEmotionModel {
    pub fn is_available() -> bool {
        false
    }

    pub fn new(_config: OnnxModelConfig) -> Result<Self, ModelError> {
        Err(ModelError::FeatureNotEnabled)
    }
}

#[cfg(not(feature = "onnx"))]
impl EmotionInference for OnnxEmotionModel {
    fn infer(&mut self, _audio: &[f32]) -> Result<EmotionScores, ModelError> {
        Err(ModelError::FeatureNotEnabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OnnxModelConfig::default();
        assert_eq!(config.n_threads, 1);
        assert_eq!(config.min_audio_samples, 8000);
        assert!(config.normalize);
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_stub_provider() {
        assert!(!OnnxEmotionModel::is_available());
        let result = OnnxEmotionModel::new(OnnxModelConfig::default());
        assert!(matches!(result, Err(ModelError::FeatureNotEnabled)));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_missing_model_file() {
        assert!(OnnxEmotionModel::is_available());
        let config = OnnxModelConfig {
            model_path: PathBuf::from("/nonexistent/emotion.onnx"),
            ..Default::default()
        };
        assert!(matches!(
            OnnxEmotionModel::new(config),
            Err(ModelError::NotFound(_))
        ));
    }
}
