use serde::{Deserialize, Serialize};

use super::correction::BiasCorrection;
use super::label::EmotionClass;

/// Raw emotion intensities from one forward pass, in head order (ang, hap, sad)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores {
    pub ang: f32,
    pub hap: f32,
    pub sad: f32,
}

impl EmotionScores {
    pub fn new(ang: f32, hap: f32, sad: f32) -> Self {
        Self { ang, hap, sad }
    }

    /// Build from a head output vector. Returns `None` unless at least three
    /// values are present; extra values are ignored.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [ang, hap, sad, ..] => Some(Self::new(*ang, *hap, *sad)),
            _ => None,
        }
    }

    pub fn get(&self, class: EmotionClass) -> f32 {
        match class {
            EmotionClass::Ang => self.ang,
            EmotionClass::Hap => self.hap,
            EmotionClass::Sad => self.sad,
        }
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.ang, self.hap, self.sad]
    }

    /// Subtract the per-class correction. The result is a separate score set;
    /// raw and corrected values are never compared against each other.
    pub fn corrected(&self, correction: &BiasCorrection) -> Self {
        Self {
            ang: self.ang - correction.ang,
            hap: self.hap - correction.hap,
            sad: self.sad - correction.sad,
        }
    }

    /// Classes ordered by score, highest first. Ties keep head order.
    /// Uses the IEEE total order, so a (positive) NaN ranks above everything.
    pub fn ranked(&self) -> [(EmotionClass, f32); 3] {
        let mut ranked = EmotionClass::ALL.map(|c| (c, self.get(c)));
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// `a - b`
    pub fn margin(&self, a: EmotionClass, b: EmotionClass) -> f32 {
        self.get(a) - self.get(b)
    }

    pub fn is_finite(&self) -> bool {
        self.ang.is_finite() && self.hap.is_finite() && self.sad.is_finite()
    }
}
