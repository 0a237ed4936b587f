//! File-level analysis: decode, infer, optionally correct, decide.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::audio::{load_wav, AudioError};
use crate::emotion::{AnalysisResult, BiasCorrection, DecisionMode};
use crate::model::{EmotionInference, ModelError};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

/// Outcome of analysing several files. Every input ends up in exactly one
/// of the two lists.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<(PathBuf, AnalyzeError)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs recordings through an inference backend and labels them.
///
/// Correction is applied only when the analyzer was built with one; the stored
/// raw scores are never modified.
pub struct Analyzer<M: EmotionInference> {
    model: M,
    correction: Option<BiasCorrection>,
    mode: DecisionMode,
}

impl<M: EmotionInference> Analyzer<M> {
    pub fn new(model: M, mode: DecisionMode) -> Self {
        Self {
            model,
            correction: None,
            mode,
        }
    }

    pub fn with_correction(mut self, correction: Option<BiasCorrection>) -> Self {
        self.correction = correction;
        self
    }

    pub fn mode(&self) -> DecisionMode {
        self.mode
    }

    pub fn correction(&self) -> Option<BiasCorrection> {
        self.correction
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Label an already-decoded 16kHz mono waveform
    pub fn analyze_samples(&mut self, id: &str, samples: &[f32]) -> Result<AnalysisResult, AnalyzeError> {
        let raw = self.model.infer(samples)?;
        let result = AnalysisResult::new(id, raw, self.correction, self.mode);
        info!(
            "{}: ang {:.4} hap {:.4} sad {:.4} -> {} ({})",
            id, raw.ang, raw.hap, raw.sad, result.label, self.mode
        );
        Ok(result)
    }

    pub fn analyze_file(&mut self, path: &Path) -> Result<AnalysisResult, AnalyzeError> {
        let audio = load_wav(path)?;
        self.analyze_samples(&path.display().to_string(), &audio.samples)
    }

    /// Analyze every file, collecting failures next to the results
    pub fn analyze_batch<'a, I>(&mut self, paths: I) -> BatchOutcome
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut outcome = BatchOutcome::default();
        for path in paths {
            match self.analyze_file(path) {
                Ok(result) => outcome.results.push(result),
                Err(e) => {
                    warn!("Failed to analyze {:?}: {}", path, e);
                    outcome.failures.push((path.to_path_buf(), e));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{write_wav, ToneProfile};
    use crate::emotion::{EmotionLabel, EmotionScores};
    use crate::model::FixedScores;
    use tempfile::tempdir;

    fn analyzer(scores: EmotionScores, mode: DecisionMode) -> Analyzer<FixedScores> {
        Analyzer::new(FixedScores::new(scores), mode)
    }

    #[test]
    fn test_analyze_samples_raw() {
        let mut a = analyzer(EmotionScores::new(3.2, 3.3, 3.1), DecisionMode::Dominance);
        let result = a.analyze_samples("clip", &[0.1; 100]).unwrap();
        assert_eq!(result.label, EmotionLabel::Hap);
        assert_eq!(result.file, "clip");
        assert!(result.correction.is_none());
    }

    #[test]
    fn test_analyze_samples_corrected_keeps_raw() {
        let mut a = analyzer(EmotionScores::new(3.2, 3.3, 3.1), DecisionMode::Dominance)
            .with_correction(Some(BiasCorrection::youden()));
        let result = a.analyze_samples("clip", &[0.1; 100]).unwrap();
        assert_eq!(result.label, EmotionLabel::Ang);
        assert_eq!(result.raw, EmotionScores::new(3.2, 3.3, 3.1));
    }

    #[test]
    fn test_modes_differ_on_ties() {
        let tie = EmotionScores::new(1.0, 1.0, 1.0);
        let mut dom = analyzer(tie, DecisionMode::Dominance);
        let mut arg = analyzer(tie, DecisionMode::ArgMax);
        assert_eq!(dom.analyze_samples("t", &[0.0; 4]).unwrap().label, EmotionLabel::Other);
        assert_eq!(arg.analyze_samples("t", &[0.0; 4]).unwrap().label, EmotionLabel::Ang);
    }

    #[test]
    fn test_analyze_file_reads_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sad.wav");
        let samples = ToneProfile::Sad.generate(1.0, 16000, 7);
        write_wav(&path, &samples, 16000).unwrap();

        let mut a = analyzer(EmotionScores::new(0.1, 0.2, 0.9), DecisionMode::Dominance);
        let result = a.analyze_file(&path).unwrap();
        assert_eq!(result.label, EmotionLabel::Sad);
        assert!(result.file.ends_with("sad.wav"));
        assert_eq!(a.model_mut().calls(), 1);
    }

    #[test]
    fn test_analyze_file_missing() {
        let mut a = analyzer(EmotionScores::new(0.1, 0.2, 0.9), DecisionMode::Dominance);
        let err = a.analyze_file(Path::new("/nonexistent/x.wav")).unwrap_err();
        assert!(matches!(err, AnalyzeError::Audio(AudioError::NotFound(_))));
        assert_eq!(a.model_mut().calls(), 0);
    }

    #[test]
    fn test_batch_reports_failures() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.wav");
        write_wav(&good, &ToneProfile::Happy.generate(0.5, 16000, 1), 16000).unwrap();
        let missing = dir.path().join("missing.wav");

        let mut a = analyzer(EmotionScores::new(0.1, 0.9, 0.2), DecisionMode::ArgMax);
        let outcome = a.analyze_batch([good.as_path(), missing.as_path()]);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].label, EmotionLabel::Hap);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, missing);
        assert!(matches!(
            outcome.failures[0].1,
            AnalyzeError::Audio(AudioError::NotFound(_))
        ));
    }

    #[test]
    fn test_batch_with_no_readable_files() {
        let mut a = analyzer(EmotionScores::new(0.1, 0.9, 0.2), DecisionMode::Dominance);
        let outcome = a.analyze_batch([Path::new("/nonexistent/a.wav"), Path::new("/nonexistent/b.wav")]);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(a.model_mut().calls(), 0);
    }
}
