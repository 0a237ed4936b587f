//! Emotion scores and the decision rule applied to them.
//!
//! The model head emits three intensities (anger, happiness, sadness). This
//! module turns them into a single label, optionally after subtracting a fixed
//! per-class correction, and records the outcome as an [`AnalysisResult`].

mod comparison;
mod correction;
mod decision;
mod label;
mod result;
mod scores;

pub use comparison::{builtin_scenarios, compare_correction, CorrectionComparison, Scenario};
pub use correction::{BiasCorrection, YOUDEN_ANG, YOUDEN_HAP, YOUDEN_SAD};
pub use decision::{decide_argmax, decide_dominance, DecisionMode, DominanceTrace};
pub use label::{EmotionClass, EmotionLabel};
pub use result::{AnalysisResult, ScoreSummary};
pub use scores::EmotionScores;
