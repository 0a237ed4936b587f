//! Emotion decision rule.
//!
//! Two explicitly selected modes turn a score triple into a label:
//!
//! - [`DecisionMode::Dominance`]: three pairwise dominance checks evaluated in
//!   a fixed order. Ties such as all-equal scores fall through to
//!   [`EmotionLabel::Other`] even when one score is visibly the maximum.
//! - [`DecisionMode::ArgMax`]: plain arg-max with first-index tie-break.
//!
//! Neither mode applies a bias correction. Callers correct the scores first
//! (see [`EmotionScores::corrected`]) when they want corrected decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::label::EmotionLabel;
use super::scores::EmotionScores;

/// Which decision rule to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionMode {
    /// Ordered pairwise dominance with "other" fallthrough
    #[default]
    Dominance,
    /// Highest score wins, earliest class on ties
    ArgMax,
}

impl DecisionMode {
    pub fn decide(&self, scores: &EmotionScores) -> EmotionLabel {
        match self {
            Self::Dominance => decide_dominance(scores.ang, scores.hap, scores.sad),
            Self::ArgMax => decide_argmax(scores.ang, scores.hap, scores.sad),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dominance => "dominance",
            Self::ArgMax => "argmax",
        }
    }
}

impl fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for DecisionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dominance" => Ok(Self::Dominance),
            "argmax" | "arg-max" => Ok(Self::ArgMax),
            _ => Err(format!("Unknown decision mode: {}", s)),
        }
    }
}

/// Three-way dominance rule.
///
/// Evaluation order is part of the contract:
/// 1. `ang >= sad && !(hap >= ang)` -> ang
/// 2. `sad >= hap && !(ang >= sad)` -> sad
/// 3. `hap >= ang && !(sad >= hap)` -> hap
/// 4. otherwise -> other
///
/// Comparisons follow IEEE semantics, so a NaN makes every check it takes
/// part in false.
#[allow(clippy::nonminimal_bool)]
pub fn decide_dominance(ang: f32, hap: f32, sad: f32) -> EmotionLabel {
    if ang >= sad && !(hap >= ang) {
        EmotionLabel::Ang
    } else if sad >= hap && !(ang >= sad) {
        EmotionLabel::Sad
    } else if hap >= ang && !(sad >= hap) {
        EmotionLabel::Hap
    } else {
        EmotionLabel::Other
    }
}

/// Arg-max over (ang, hap, sad). A later class replaces the current best only
/// when strictly greater, so ties go to the earlier class. Never returns
/// [`EmotionLabel::Other`].
pub fn decide_argmax(ang: f32, hap: f32, sad: f32) -> EmotionLabel {
    let mut best = (EmotionLabel::Ang, ang);
    if hap > best.1 {
        best = (EmotionLabel::Hap, hap);
    }
    if sad > best.1 {
        best = (EmotionLabel::Sad, sad);
    }
    best.0
}

/// The pairwise checks the dominance rule is built from, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DominanceTrace {
    pub ang_ge_sad: bool,
    pub sad_ge_hap: bool,
    pub hap_ge_ang: bool,
}

impl DominanceTrace {
    pub fn of(scores: &EmotionScores) -> Self {
        Self {
            ang_ge_sad: scores.ang >= scores.sad,
            sad_ge_hap: scores.sad >= scores.hap,
            hap_ge_ang: scores.hap >= scores.ang,
        }
    }

    /// Label implied by the checks; always equal to [`decide_dominance`]
    pub fn label(&self) -> EmotionLabel {
        if self.ang_ge_sad && !self.hap_ge_ang {
            EmotionLabel::Ang
        } else if self.sad_ge_hap && !self.ang_ge_sad {
            EmotionLabel::Sad
        } else if self.hap_ge_ang && !self.sad_ge_hap {
            EmotionLabel::Hap
        } else {
            EmotionLabel::Other
        }
    }
}
