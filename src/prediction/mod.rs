//! Camera prediction adapter
//!
//! Turns one tick's feature row into an on-air camera decision. The model
//! behind [`Classifier`] is opaque: it returns class probabilities and the
//! class labels they belong to, matched by position. [`CameraPredictor`]
//! applies the confidence gate on top.
//!
//! Models live in a small on-disk library, one directory per [`ModelKind`],
//! named after the history window they were trained with:
//!
//! ```text
//! <models_dir>/expert/model_chunk100.rhai
//! <models_dir>/researcher/model_chunk100.rhai
//! ```

pub mod rhai_model;

pub use rhai_model::RhaiClassifier;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DirectorError, Result};
use crate::session::types::UNSET_LABEL;

/// Default confidence a prediction must exceed to switch cameras
pub const DEFAULT_FORECAST_THRESHOLD: f64 = 0.425;

/// Per-class probabilities for a single input row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassProbabilities {
    pub classes: Vec<i32>,
    pub probabilities: Vec<f64>,
}

impl ClassProbabilities {
    pub fn new(classes: Vec<i32>, probabilities: Vec<f64>) -> Self {
        Self {
            classes,
            probabilities,
        }
    }

    /// Most probable class and its probability; the first wins on ties
    pub fn best(&self) -> Result<(i32, f64)> {
        if self.classes.len() != self.probabilities.len() {
            return Err(DirectorError::Classifier(format!(
                "{} classes but {} probabilities",
                self.classes.len(),
                self.probabilities.len()
            )));
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in self.probabilities.iter().enumerate() {
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((i, p)),
            }
        }
        best.map(|(i, p)| (self.classes[i], p))
            .ok_or_else(|| DirectorError::Classifier("empty probability vector".to_string()))
    }
}

/// An externally trained camera classifier
#[cfg_attr(test, mockall::automock)]
pub trait Classifier: Send {
    /// Class probabilities for the first row of `features`
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<ClassProbabilities>;
}

/// Which trained model family to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// Trained on labels authored by a film professional
    Expert,
    /// Trained on labels authored by the research team
    #[default]
    Researcher,
}

impl ModelKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ModelKind::Expert => "expert",
            ModelKind::Researcher => "researcher",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl std::str::FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "expert" => Ok(ModelKind::Expert),
            "researcher" => Ok(ModelKind::Researcher),
            other => Err(format!("unknown model kind {other:?}")),
        }
    }
}

/// Library path of the model of `kind` trained with history `window`
pub fn model_path(models_dir: &Path, kind: ModelKind, window: usize) -> PathBuf {
    models_dir
        .join(kind.dir_name())
        .join(format!("model_chunk{window}.rhai"))
}

/// Classifier plus confidence gate
pub struct CameraPredictor {
    classifier: Box<dyn Classifier>,
    threshold: f64,
    kind: Option<ModelKind>,
}

impl std::fmt::Debug for CameraPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraPredictor")
            .field("threshold", &self.threshold)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl CameraPredictor {
    pub fn new(classifier: Box<dyn Classifier>, threshold: f64) -> Self {
        Self {
            classifier,
            threshold,
            kind: None,
        }
    }

    /// Load the library model of `kind` for history `window`
    pub fn from_library(
        models_dir: &Path,
        kind: ModelKind,
        window: usize,
        threshold: f64,
    ) -> Result<Self> {
        let path = model_path(models_dir, kind, window);
        let classifier = RhaiClassifier::load(&path)?;
        tracing::info!("Loaded {} model from {:?}", kind, path);
        Ok(Self {
            classifier: Box::new(classifier),
            threshold,
            kind: Some(kind),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    /// Library kind this predictor was loaded from, if any
    pub fn kind(&self) -> Option<ModelKind> {
        self.kind
    }

    /// Camera label for the given feature row, or [`UNSET_LABEL`] when the
    /// best class does not clear the threshold
    pub fn predict(&self, row: Vec<f64>) -> Result<i32> {
        let probabilities = self.classifier.predict_proba(&[row])?;
        let (class, p) = probabilities.best()?;
        if p > self.threshold {
            tracing::trace!("Predicted camera {} (p = {:.3})", class, p);
            Ok(class)
        } else {
            tracing::trace!(
                "Holding camera: best {} at p = {:.3} below {:.3}",
                class,
                p,
                self.threshold
            );
            Ok(UNSET_LABEL)
        }
    }
}
