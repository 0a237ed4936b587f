//! Load-path consistency.
//!
//! The same checkpoint can be materialised in more than one way (e.g. a
//! pretrained base with the fine-tuned weights loaded on top, versus a bare
//! config with the same weights). Both should produce identical outputs for the
//! same input; this module compares them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;

use super::{EmotionInference, ModelError};
use crate::audio::TARGET_SAMPLE_RATE;
use crate::emotion::EmotionScores;

/// Default tolerance for treating two outputs as equal
pub const DEFAULT_ATOL: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutputComparison {
    pub a: EmotionScores,
    pub b: EmotionScores,
    pub max_abs_diff: f32,
    pub atol: f32,
}

impl OutputComparison {
    pub fn all_close(&self) -> bool {
        self.max_abs_diff <= self.atol
    }
}

/// Element-wise comparison of two score sets. NaN anywhere makes the
/// difference NaN, which is never "close".
pub fn compare_outputs(a: &EmotionScores, b: &EmotionScores, atol: f32) -> OutputComparison {
    let max_abs_diff = a
        .to_array()
        .iter()
        .zip(b.to_array().iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, |acc, d| if d.is_nan() || acc.is_nan() { f32::NAN } else { acc.max(d) });

    OutputComparison {
        a: *a,
        b: *b,
        max_abs_diff,
        atol,
    }
}

/// One second of seeded standard-normal noise at 16kHz
pub fn probe_signal(seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..TARGET_SAMPLE_RATE as usize)
        .map(|_| rng.sample::<f32, _>(StandardNormal))
        .collect()
}

/// Run the same input through two models and compare their scores
pub fn check_consistency(
    first: &mut dyn EmotionInference,
    second: &mut dyn EmotionInference,
    input: &[f32],
    atol: f32,
) -> Result<OutputComparison, ModelError> {
    let a = first.infer(input)?;
    let b = second.infer(input)?;
    let cmp = compare_outputs(&a, &b, atol);

    tracing::info!(
        "Load consistency: max diff {:.10} (atol {}), all close: {}",
        cmp.max_abs_diff,
        atol,
        cmp.all_close()
    );

    Ok(cmp)
}
