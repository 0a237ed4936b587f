use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion classes produced by the model head, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionClass {
    Ang,
    Hap,
    Sad,
}

impl EmotionClass {
    /// All classes in head output order (ang, hap, sad)
    pub const ALL: [EmotionClass; 3] = [Self::Ang, Self::Hap, Self::Sad];

    /// Row index of this class in the head output
    pub fn index(&self) -> usize {
        match self {
            Self::Ang => 0,
            Self::Hap => 1,
            Self::Sad => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ang => "ang",
            Self::Hap => "hap",
            Self::Sad => "sad",
        }
    }

    /// Long English name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ang => "anger",
            Self::Hap => "happiness",
            Self::Sad => "sadness",
        }
    }
}

impl fmt::Display for EmotionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Decided label: one of the three classes or the dominance fallthrough
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Ang,
    Hap,
    Sad,
    Other,
}

impl EmotionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ang => "ang",
            Self::Hap => "hap",
            Self::Sad => "sad",
            Self::Other => "other",
        }
    }

    /// The class this label names, `None` for "other"
    pub fn class(&self) -> Option<EmotionClass> {
        match self {
            Self::Ang => Some(EmotionClass::Ang),
            Self::Hap => Some(EmotionClass::Hap),
            Self::Sad => Some(EmotionClass::Sad),
            Self::Other => None,
        }
    }
}

impl From<EmotionClass> for EmotionLabel {
    fn from(class: EmotionClass) -> Self {
        match class {
            EmotionClass::Ang => Self::Ang,
            EmotionClass::Hap => Self::Hap,
            EmotionClass::Sad => Self::Sad,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ang" => Ok(Self::Ang),
            "hap" => Ok(Self::Hap),
            "sad" => Ok(Self::Sad),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown emotion label: {}", s)),
        }
    }
}
