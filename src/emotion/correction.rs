use serde::{Deserialize, Serialize};

/// Youden-index thresholds selected offline on the validation set
pub const YOUDEN_ANG: f32 = 0.259_408_62;
pub const YOUDEN_HAP: f32 = 0.585_356_35;
pub const YOUDEN_SAD: f32 = 0.207_324_06;

/// Per-class offsets subtracted from raw scores before a decision.
///
/// Applying a correction is always the caller's explicit choice; the decision
/// functions never look at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasCorrection {
    pub ang: f32,
    pub hap: f32,
    pub sad: f32,
}

impl BiasCorrection {
    pub fn new(ang: f32, hap: f32, sad: f32) -> Self {
        Self { ang, hap, sad }
    }

    /// The documented thresholds (ang 0.2594, hap 0.5854, sad 0.2073)
    pub fn youden() -> Self {
        Self::new(YOUDEN_ANG, YOUDEN_HAP, YOUDEN_SAD)
    }

    /// Largest offset divided by the smallest, used to flag lopsided corrections
    pub fn spread_ratio(&self) -> f32 {
        let values = [self.ang, self.hap, self.sad];
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        if min == 0.0 {
            f32::INFINITY
        } else {
            max / min
        }
    }
}

impl Default for BiasCorrection {
    fn default() -> Self {
        Self::youden()
    }
}
