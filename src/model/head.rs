//! Classification head inspection.
//!
//! Reads a safetensors export of the fine-tuned model and summarises the final
//! linear layer (`fc.weight` `[3, hidden]`, `fc.bias` `[3]`): per-class weight
//! statistics, bias values and which class the bias favours. A class whose bias
//! is much larger than the others tends to win on near-silent input.

use ndarray::{Array2, Axis};
use safetensors::{Dtype, SafeTensors};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::ModelError;
use crate::emotion::{decide_argmax, EmotionClass, EmotionScores};

pub const DEFAULT_WEIGHT_KEY: &str = "fc.weight";
pub const DEFAULT_BIAS_KEY: &str = "fc.bias";

/// Name, dtype and shape of one stored tensor
#[derive(Debug, Clone, Serialize)]
pub struct TensorSummary {
    pub name: String,
    pub dtype: String,
    pub shape: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightStats {
    pub mean: f32,
    /// Sample standard deviation (n - 1)
    pub std: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassWeightStats {
    pub class: EmotionClass,
    pub stats: WeightStats,
    /// L2 norm of the class weight vector
    pub norm: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeadReport {
    pub path: PathBuf,
    pub file_size_bytes: u64,
    /// Every tensor in the file, sorted by name
    pub tensors: Vec<TensorSummary>,
    pub weight_shape: [usize; 2],
    pub overall: WeightStats,
    pub classes: Vec<ClassWeightStats>,
    pub bias: EmotionScores,
    /// Class with the largest bias term
    pub bias_leader: EmotionClass,
}

impl HeadReport {
    pub fn file_size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / 1024.0 / 1024.0
    }

    pub fn class_stats(&self, class: EmotionClass) -> Option<&ClassWeightStats> {
        self.classes.iter().find(|c| c.class == class)
    }
}

/// Inspect the head stored under `weight_key` / `bias_key`
pub fn inspect_head(path: &Path, weight_key: &str, bias_key: &str) -> Result<HeadReport, ModelError> {
    if !path.exists() {
        return Err(ModelError::NotFound(path.to_path_buf()));
    }

    let buffer = std::fs::read(path)?;
    let file_size_bytes = buffer.len() as u64;
    info!(
        "Inspecting {:?} ({:.2} MB)",
        path,
        file_size_bytes as f64 / 1024.0 / 1024.0
    );

    let st = SafeTensors::deserialize(&buffer).map_err(|e| ModelError::Format(e.to_string()))?;

    let mut tensors: Vec<TensorSummary> = st
        .tensors()
        .into_iter()
        .map(|(name, view)| TensorSummary {
            name,
            dtype: format!("{:?}", view.dtype()),
            shape: view.shape().to_vec(),
        })
        .collect();
    tensors.sort_by(|a, b| a.name.cmp(&b.name));
    debug!("{} tensors in file", tensors.len());

    let (weight_shape, weight_data) = read_f32(&st, weight_key)?;
    let (bias_shape, bias_data) = read_f32(&st, bias_key)?;

    let [rows, cols] = match weight_shape.as_slice() {
        [r, c] if *r >= 3 && *c > 0 => [*r, *c],
        other => {
            return Err(ModelError::HeadShape(format!(
                "{} has shape {:?}, expected [3, hidden]",
                weight_key, other
            )))
        }
    };

    let bias = EmotionScores::from_slice(&bias_data).ok_or_else(|| {
        ModelError::HeadShape(format!(
            "{} has shape {:?}, expected [3]",
            bias_key, bias_shape
        ))
    })?;

    let weights = Array2::from_shape_vec((rows, cols), weight_data)
        .map_err(|e| ModelError::HeadShape(e.to_string()))?;

    let overall = stats_of(weights.iter().copied(), weights.len());

    let classes = EmotionClass::ALL
        .iter()
        .map(|&class| {
            let row = weights.index_axis(Axis(0), class.index());
            ClassWeightStats {
                class,
                stats: stats_of(row.iter().copied(), row.len()),
                norm: row.dot(&row).sqrt(),
            }
        })
        .collect();

    let bias_leader = decide_argmax(bias.ang, bias.hap, bias.sad)
        .class()
        .unwrap_or(EmotionClass::Ang);

    Ok(HeadReport {
        path: path.to_path_buf(),
        file_size_bytes,
        tensors,
        weight_shape: [rows, cols],
        overall,
        classes,
        bias,
        bias_leader,
    })
}

fn read_f32(st: &SafeTensors<'_>, name: &str) -> Result<(Vec<usize>, Vec<f32>), ModelError> {
    let view = st
        .tensor(name)
        .map_err(|_| ModelError::MissingTensor(name.to_string()))?;

    if view.dtype() != Dtype::F32 {
        return Err(ModelError::UnsupportedDtype {
            name: name.to_string(),
            dtype: format!("{:?}", view.dtype()),
        });
    }

    let data = view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    Ok((view.shape().to_vec(), data))
}

fn stats_of(values: impl Iterator<Item = f32> + Clone, n: usize) -> WeightStats {
    if n == 0 {
        return WeightStats {
            mean: 0.0,
            std: 0.0,
            min: 0.0,
            max: 0.0,
        };
    }

    let mean = values.clone().map(|v| v as f64).sum::<f64>() / n as f64;
    let var = if n > 1 {
        values.clone().map(|v| (v as f64 - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        0.0
    };
    let (min, max) = values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    WeightStats {
        mean: mean as f32,
        std: var.sqrt() as f32,
        min,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Hand-assembled safetensors file: u64 header length, JSON header, data
    fn safetensors_bytes(tensors: &[(&str, Vec<usize>, Vec<f32>)]) -> Vec<u8> {
        let mut header = serde_json::Map::new();
        let mut data = Vec::new();
        for (name, shape, values) in tensors {
            let start = data.len();
            for v in values {
                data.extend_from_slice(&v.to_le_bytes());
            }
            header.insert(
                name.to_string(),
                serde_json::json!({
                    "dtype": "F32",
                    "shape": shape,
                    "data_offsets": [start, data.len()],
                }),
            );
        }
        let header = serde_json::to_vec(&header).unwrap();

        let mut bytes = Vec::new();
        bytes.write_all(&(header.len() as u64).to_le_bytes()).unwrap();
        bytes.write_all(&header).unwrap();
        bytes.write_all(&data).unwrap();
        bytes
    }

    fn head_file(weight: Vec<f32>, bias: Vec<f32>) -> NamedTempFile {
        let hidden = weight.len() / 3;
        let bytes = safetensors_bytes(&[
            ("encoder.layer0.weight", vec![2], vec![0.5, -0.5]),
            ("fc.weight", vec![3, hidden], weight),
            ("fc.bias", vec![3], bias),
        ]);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file
    }

    #[test]
    fn test_inspect_head_statistics() {
        let file = head_file(
            vec![
                1.0, 1.0, 1.0, 1.0, // ang
                0.0, 2.0, 0.0, 2.0, // hap
                3.0, 0.0, 0.0, 4.0, // sad
            ],
            vec![0.1, 0.2, 0.7],
        );

        let report = inspect_head(file.path(), DEFAULT_WEIGHT_KEY, DEFAULT_BIAS_KEY).unwrap();
        assert_eq!(report.weight_shape, [3, 4]);
        assert_eq!(report.tensors.len(), 3);
        assert_eq!(report.tensors[0].name, "encoder.layer0.weight");
        assert_eq!(report.bias_leader, EmotionClass::Sad);
        assert!((report.bias.sad - 0.7).abs() < 1e-6);

        let ang = report.class_stats(EmotionClass::Ang).unwrap();
        assert_eq!(ang.stats.mean, 1.0);
        assert_eq!(ang.stats.std, 0.0);
        assert_eq!(ang.norm, 2.0);

        let hap = report.class_stats(EmotionClass::Hap).unwrap();
        assert!((hap.stats.mean - 1.0).abs() < 1e-6);
        // sample std of [0, 2, 0, 2] = sqrt(4/3)
        assert!((hap.stats.std - 1.1547).abs() < 1e-3);

        let sad = report.class_stats(EmotionClass::Sad).unwrap();
        assert_eq!(sad.norm, 5.0);
        assert_eq!(sad.stats.max, 4.0);
        assert_eq!(report.overall.min, 0.0);
        assert_eq!(report.overall.max, 4.0);
    }

    #[test]
    fn test_missing_head_tensor() {
        let bytes = safetensors_bytes(&[("other.weight", vec![2], vec![1.0, 2.0])]);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let result = inspect_head(file.path(), DEFAULT_WEIGHT_KEY, DEFAULT_BIAS_KEY);
        assert!(matches!(result, Err(ModelError::MissingTensor(name)) if name == "fc.weight"));
    }

    #[test]
    fn test_wrong_head_shape() {
        let bytes = safetensors_bytes(&[
            ("fc.weight", vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]),
            ("fc.bias", vec![2], vec![0.0, 0.0]),
        ]);
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        assert!(matches!(
            inspect_head(file.path(), DEFAULT_WEIGHT_KEY, DEFAULT_BIAS_KEY),
            Err(ModelError::HeadShape(_))
        ));
    }

    #[test]
    fn test_not_a_safetensors_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"pickle data, not safetensors").unwrap();
        assert!(matches!(
            inspect_head(file.path(), DEFAULT_WEIGHT_KEY, DEFAULT_BIAS_KEY),
            Err(ModelError::Format(_))
        ));
    }
}
