use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::emotion::{BiasCorrection, DecisionMode};
use crate::model::{OnnxModelConfig, DEFAULT_BIAS_KEY, DEFAULT_WEIGHT_KEY};

/// Default file name of the exported encoder + head
pub const DEFAULT_MODEL_FILENAME: &str = "emotion-wav2vec2.onnx";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    // Decision
    pub decision_mode: DecisionMode,
    pub apply_correction: bool,
    pub correction: BiasCorrection,

    // Inference
    pub n_threads: usize,
    pub min_audio_samples: usize,
    pub normalize_waveform: bool,

    // Model location
    pub model_path: Option<PathBuf>,
    pub model_url: Option<String>,

    // Head inspection
    pub head_weight_key: String,
    pub head_bias_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            decision_mode: DecisionMode::Dominance,
            apply_correction: false,
            correction: BiasCorrection::youden(),
            n_threads: 1,
            min_audio_samples: 8000,
            normalize_waveform: true,
            model_path: None,
            model_url: None,
            head_weight_key: DEFAULT_WEIGHT_KEY.to_string(),
            head_bias_key: DEFAULT_BIAS_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".emotion-probe"))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Get the default models directory
    pub fn default_models_dir() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("models"))
    }

    /// Get the model file path
    pub fn get_model_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.model_path {
            Ok(path.clone())
        } else {
            Ok(Self::default_models_dir()?.join(DEFAULT_MODEL_FILENAME))
        }
    }

    /// The correction to apply, if the config enables one
    pub fn active_correction(&self) -> Option<BiasCorrection> {
        self.apply_correction.then_some(self.correction)
    }

    /// Inference settings for a model at `model_path`
    pub fn onnx_config(&self, model_path: PathBuf) -> OnnxModelConfig {
        OnnxModelConfig {
            model_path,
            n_threads: self.n_threads,
            min_audio_samples: self.min_audio_samples,
            normalize: self.normalize_waveform,
        }
    }
}
