//! Raw vs corrected decisions on the same input.

use serde::Serialize;

use super::correction::BiasCorrection;
use super::decision::DecisionMode;
use super::label::EmotionLabel;
use super::scores::EmotionScores;

/// Outcome of deciding one raw score set with and without a correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrectionComparison {
    pub mode: DecisionMode,
    pub raw: EmotionScores,
    pub corrected: EmotionScores,
    pub raw_label: EmotionLabel,
    pub corrected_label: EmotionLabel,
}

impl CorrectionComparison {
    /// True when the correction flipped the decision
    pub fn changed(&self) -> bool {
        self.raw_label != self.corrected_label
    }
}

/// Decide `raw` and `raw - correction` separately with the same mode
pub fn compare_correction(
    raw: &EmotionScores,
    correction: &BiasCorrection,
    mode: DecisionMode,
) -> CorrectionComparison {
    let corrected = raw.corrected(correction);
    CorrectionComparison {
        mode,
        raw: *raw,
        corrected,
        raw_label: mode.decide(raw),
        corrected_label: mode.decide(&corrected),
    }
}

/// A named raw score set used to visualise the correction's effect
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub scores: EmotionScores,
}

/// Hypothetical head outputs covering each dominant class, a three-way tie
/// and a typical close call
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "happiness dominant",
            scores: EmotionScores::new(2.0, 4.0, 2.5),
        },
        Scenario {
            name: "anger dominant",
            scores: EmotionScores::new(4.0, 2.0, 2.5),
        },
        Scenario {
            name: "sadness dominant",
            scores: EmotionScores::new(2.0, 2.5, 4.0),
        },
        Scenario {
            name: "all equal",
            scores: EmotionScores::new(3.0, 3.0, 3.0),
        },
        Scenario {
            name: "typical close values",
            scores: EmotionScores::new(3.2, 3.3, 3.1),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_flips_close_happiness() {
        let raw = EmotionScores::new(3.2, 3.3, 3.1);
        for mode in [DecisionMode::Dominance, DecisionMode::ArgMax] {
            let cmp = compare_correction(&raw, &BiasCorrection::youden(), mode);
            assert_eq!(cmp.raw_label, EmotionLabel::Hap, "mode {}", mode);
            assert_eq!(cmp.corrected_label, EmotionLabel::Ang, "mode {}", mode);
            assert!(cmp.changed());
        }
    }

    #[test]
    fn test_clear_winners_survive_correction() {
        let correction = BiasCorrection::youden();
        for scenario in builtin_scenarios().iter().take(3) {
            let cmp = compare_correction(&scenario.scores, &correction, DecisionMode::Dominance);
            assert!(!cmp.changed(), "{} should not flip", scenario.name);
        }
    }

    #[test]
    fn test_all_equal_scenario() {
        let scenario = builtin_scenarios()
            .into_iter()
            .find(|s| s.name == "all equal")
            .unwrap();
        let correction = BiasCorrection::youden();

        let dominance = compare_correction(&scenario.scores, &correction, DecisionMode::Dominance);
        assert_eq!(dominance.raw_label, EmotionLabel::Other);
        // 3.0 - 0.2073 is the largest corrected value
        assert_eq!(dominance.corrected_label, EmotionLabel::Sad);

        let argmax = compare_correction(&scenario.scores, &correction, DecisionMode::ArgMax);
        assert_eq!(argmax.raw_label, EmotionLabel::Ang);
        assert_eq!(argmax.corrected_label, EmotionLabel::Sad);
    }

    #[test]
    fn test_zero_correction_never_changes() {
        let zero = BiasCorrection::new(0.0, 0.0, 0.0);
        for scenario in builtin_scenarios() {
            let cmp = compare_correction(&scenario.scores, &zero, DecisionMode::Dominance);
            assert_eq!(cmp.raw, cmp.corrected);
            assert!(!cmp.changed());
        }
    }
}
