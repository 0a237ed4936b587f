//! Basic signal statistics printed next to emotion scores.
//!
//! Pitch is estimated per frame with the McLeod detector and averaged over
//! frames that fall in the human vocal range.

use pitch_detection::detector::mcleod::McLeodDetector;
use pitch_detection::detector::PitchDetector;
use serde::Serialize;

/// Frame size for pitch detection (~64ms at 16kHz)
const FRAME_SIZE: usize = 1024;

/// Hop size between frames (50% overlap)
const HOP_SIZE: usize = 512;

const MIN_PITCH: f32 = 50.0;
const MAX_PITCH: f32 = 500.0;
const POWER_THRESHOLD: f32 = 0.8;
const CLARITY_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalStats {
    pub sample_rate: u32,
    pub sample_count: usize,
    pub duration_secs: f32,
    pub mean_abs: f32,
    pub peak: f32,
    pub rms: f32,
    /// Mean F0 over voiced frames, `None` when nothing voiced was found
    pub mean_pitch_hz: Option<f32>,
    /// Fraction of frames with a pitch in the vocal range
    pub voiced_ratio: f32,
}

impl SignalStats {
    pub fn compute(samples: &[f32], sample_rate: u32) -> Self {
        let n = samples.len();
        let (sum_abs, sum_sq, peak) = samples.iter().fold((0.0f64, 0.0f64, 0.0f32), |acc, &s| {
            (acc.0 + s.abs() as f64, acc.1 + (s as f64).powi(2), acc.2.max(s.abs()))
        });
        let (mean_abs, rms) = if n == 0 {
            (0.0, 0.0)
        } else {
            ((sum_abs / n as f64) as f32, (sum_sq / n as f64).sqrt() as f32)
        };

        let (mean_pitch_hz, voiced_ratio) = estimate_pitch(samples, sample_rate);

        Self {
            sample_rate,
            sample_count: n,
            duration_secs: if sample_rate == 0 { 0.0 } else { n as f32 / sample_rate as f32 },
            mean_abs,
            peak,
            rms,
            mean_pitch_hz,
            voiced_ratio,
        }
    }
}

fn estimate_pitch(samples: &[f32], sample_rate: u32) -> (Option<f32>, f32) {
    if samples.len() < FRAME_SIZE || sample_rate == 0 {
        return (None, 0.0);
    }

    let mut detector = McLeodDetector::new(FRAME_SIZE, FRAME_SIZE / 2);
    let mut pitches = Vec::new();
    let mut total_frames = 0usize;

    let mut start = 0;
    while start + FRAME_SIZE <= samples.len() {
        let frame = &samples[start..start + FRAME_SIZE];
        total_frames += 1;

        if let Some(pitch) =
            detector.get_pitch(frame, sample_rate as usize, POWER_THRESHOLD, CLARITY_THRESHOLD)
        {
            if (MIN_PITCH..=MAX_PITCH).contains(&pitch.frequency) {
                pitches.push(pitch.frequency);
            }
        }

        start += HOP_SIZE;
    }

    if pitches.is_empty() {
        return (None, 0.0);
    }

    let mean = pitches.iter().sum::<f32>() / pitches.len() as f32;
    (Some(mean), pitches.len() as f32 / total_frames as f32)
}
