//! Rhai-scripted classifier models
//!
//! A model script must define
//!
//! ```text
//! fn predict_proba(features) { ... }
//! ```
//!
//! taking the feature matrix (an array of rows, each an array of floats) and
//! returning an object map with two arrays of equal length:
//! `classes` (integers) and `probabilities` (floats) for the first row.

use std::path::{Path, PathBuf};

use rhai::{Array, Dynamic, Engine, Map, Scope, AST};

use super::{ClassProbabilities, Classifier};
use crate::error::{DirectorError, Result, ResultExt};

const ENTRY_POINT: &str = "predict_proba";

pub struct RhaiClassifier {
    engine: Engine,
    ast: AST,
    source: PathBuf,
}

impl std::fmt::Debug for RhaiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiClassifier")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl RhaiClassifier {
    /// Load and compile a model script from disk
    pub fn load(path: &Path) -> Result<Self> {
        let script = std::fs::read_to_string(path).map_err(|e| {
            DirectorError::Classifier(format!("cannot read model {}: {e}", path.display()))
        })?;
        let mut classifier = Self::from_source(&script)?;
        classifier.source = path.to_path_buf();
        Ok(classifier)
    }

    /// Compile a model from script text
    pub fn from_source(script: &str) -> Result<Self> {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);

        let ast = engine
            .compile(script)
            .map_err(|e| DirectorError::Classifier(format!("model does not compile: {e}")))?;

        if !ast
            .iter_functions()
            .any(|f| f.name == ENTRY_POINT && f.params.len() == 1)
        {
            return Err(DirectorError::Classifier(format!(
                "model does not define {ENTRY_POINT}(features)"
            )));
        }

        Ok(Self {
            engine,
            ast,
            source: PathBuf::new(),
        })
    }

    /// Safety limits so a runaway model cannot stall playback forever
    fn configure_engine(engine: &mut Engine) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(1_000_000);
        engine.set_max_array_size(100_000);
        engine.set_max_map_size(1_000);
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn to_matrix(features: &[Vec<f64>]) -> Array {
        features
            .iter()
            .map(|row| Dynamic::from_array(row.iter().map(|&v| Dynamic::from_float(v)).collect()))
            .collect()
    }

    fn field<T: Clone + Send + Sync + 'static>(output: &Map, name: &str) -> Result<Vec<T>> {
        let value = output.get(name).cloned().ok_or_else(|| {
            DirectorError::Classifier(format!("{ENTRY_POINT} result has no `{name}`"))
        })?;
        value.into_typed_array::<T>().map_err(|e| {
            DirectorError::Classifier(format!("{ENTRY_POINT} result `{name}`: {e}"))
        })
    }
}

impl Classifier for RhaiClassifier {
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<ClassProbabilities> {
        let mut scope = Scope::new();
        let output: Map = self
            .engine
            .call_fn(&mut scope, &self.ast, ENTRY_POINT, (Self::to_matrix(features),))
            .context("model evaluation failed")?;

        let classes = Self::field::<i64>(&output, "classes")?
            .into_iter()
            .map(|c| {
                i32::try_from(c)
                    .map_err(|_| DirectorError::Classifier(format!("class label {c} out of range")))
            })
            .collect::<Result<Vec<_>>>()?;
        let probabilities = Self::field::<f64>(&output, "probabilities")?;

        Ok(ClassProbabilities::new(classes, probabilities))
    }
}
