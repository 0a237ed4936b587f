/// Variance floor used by the encoder's feature extractor
const NORM_EPSILON: f32 = 1e-7;

/// Zero-mean, unit-variance normalisation applied before the encoder.
///
/// Computes `(x - mean) / sqrt(var + 1e-7)` with the population variance,
/// matching the processor the model was trained with. Empty input yields an
/// empty output.
pub fn normalize_waveform(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&s| s as f64).sum::<f64>() / n;
    let var = samples
        .iter()
        .map(|&s| (s as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    let denom = (var + NORM_EPSILON as f64).sqrt();

    samples
        .iter()
        .map(|&s| ((s as f64 - mean) / denom) as f32)
        .collect()
}
