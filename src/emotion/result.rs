use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::correction::BiasCorrection;
use super::decision::{decide_argmax, DecisionMode};
use super::label::{EmotionClass, EmotionLabel};
use super::scores::EmotionScores;

/// One analysed input: its raw scores and the label decided from them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    /// Input identifier, usually a file path
    pub file: String,
    /// Scores exactly as the model produced them
    pub raw: EmotionScores,
    /// Correction subtracted before deciding, if the caller asked for one
    pub correction: Option<BiasCorrection>,
    pub mode: DecisionMode,
    #[serde(rename = "emo")]
    pub label: EmotionLabel,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(
        file: impl Into<String>,
        raw: EmotionScores,
        correction: Option<BiasCorrection>,
        mode: DecisionMode,
    ) -> Self {
        let decided_on = match &correction {
            Some(c) => raw.corrected(c),
            None => raw,
        };
        Self {
            id: Uuid::new_v4(),
            file: file.into(),
            raw,
            correction,
            mode,
            label: mode.decide(&decided_on),
            analyzed_at: Utc::now(),
        }
    }

    /// The score set the label was decided on (raw, or raw minus correction)
    pub fn decision_scores(&self) -> EmotionScores {
        match &self.correction {
            Some(c) => self.raw.corrected(c),
            None => self.raw,
        }
    }

    /// Arg-max label over the same score set the decision used
    pub fn argmax_label(&self) -> EmotionLabel {
        let s = self.decision_scores();
        decide_argmax(s.ang, s.hap, s.sad)
    }

    /// Whether the decided label names the highest-scoring class
    pub fn agrees_with_argmax(&self) -> bool {
        self.label == self.argmax_label()
    }
}

/// Mean raw scores over a batch of results
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: EmotionScores,
    /// Class with the highest mean (earliest class on ties)
    pub leading: EmotionClass,
}

impl ScoreSummary {
    /// Returns `None` for an empty batch
    pub fn from_results(results: &[AnalysisResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let n = results.len() as f32;
        let (ang, hap, sad) = results.iter().fold((0.0, 0.0, 0.0), |acc, r| {
            (acc.0 + r.raw.ang, acc.1 + r.raw.hap, acc.2 + r.raw.sad)
        });
        let mean = EmotionScores::new(ang / n, hap / n, sad / n);

        let leading = decide_argmax(mean.ang, mean.hap, mean.sad)
            .class()
            .unwrap_or(EmotionClass::Ang);

        Some(Self {
            count: results.len(),
            mean,
            leading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_without_correction() {
        let r = AnalysisResult::new(
            "a.wav",
            EmotionScores::new(3.2, 3.3, 3.1),
            None,
            DecisionMode::Dominance,
        );
        assert_eq!(r.label, EmotionLabel::Hap);
        assert_eq!(r.decision_scores(), r.raw);
        assert!(r.agrees_with_argmax());
    }

    #[test]
    fn test_result_with_correction_decides_on_corrected() {
        let r = AnalysisResult::new(
            "a.wav",
            EmotionScores::new(3.2, 3.3, 3.1),
            Some(BiasCorrection::youden()),
            DecisionMode::Dominance,
        );
        assert_eq!(r.label, EmotionLabel::Ang);
        assert_eq!(r.raw, EmotionScores::new(3.2, 3.3, 3.1));
        assert_eq!(r.argmax_label(), EmotionLabel::Ang);
    }

    #[test]
    fn test_fallthrough_disagrees_with_argmax() {
        let r = AnalysisResult::new(
            "tie.wav",
            EmotionScores::new(1.0, 1.0, 1.0),
            None,
            DecisionMode::Dominance,
        );
        assert_eq!(r.label, EmotionLabel::Other);
        assert_eq!(r.argmax_label(), EmotionLabel::Ang);
        assert!(!r.agrees_with_argmax());
    }

    #[test]
    fn test_result_json_uses_emo_key() {
        let r = AnalysisResult::new(
            "x.wav",
            EmotionScores::new(4.0, 2.0, 2.5),
            None,
            DecisionMode::ArgMax,
        );
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["emo"], "ang");
        assert_eq!(value["file"], "x.wav");
        assert_eq!(value["mode"], "argmax");
        assert!(value["correction"].is_null());
    }

    #[test]
    fn test_summary_means_and_leader() {
        let results: Vec<AnalysisResult> = [
            EmotionScores::new(0.1, 0.2, 0.9),
            EmotionScores::new(0.3, 0.2, 0.5),
            EmotionScores::new(0.2, 0.5, 0.4),
        ]
        .into_iter()
        .map(|s| AnalysisResult::new("f.wav", s, None, DecisionMode::Dominance))
        .collect();

        let summary = ScoreSummary::from_results(&results).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean.ang - 0.2).abs() < 1e-6);
        assert!((summary.mean.hap - 0.3).abs() < 1e-6);
        assert!((summary.mean.sad - 0.6).abs() < 1e-6);
        assert_eq!(summary.leading, EmotionClass::Sad);
    }

    #[test]
    fn test_summary_empty() {
        assert!(ScoreSummary::from_results(&[]).is_none());
    }
}
