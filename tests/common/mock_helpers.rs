//! Stub classifiers

use std::sync::{Arc, Mutex};

use camdirector::error::Result;
use camdirector::prediction::{ClassProbabilities, Classifier};
use camdirector::CameraPredictor;

/// Feature rows seen by a stub, shared with the test
pub type SeenRows = Arc<Mutex<Vec<Vec<f64>>>>;

/// Always predicts one class with a fixed confidence
pub struct StubClassifier {
    classes: Vec<i32>,
    probabilities: Vec<f64>,
    seen: SeenRows,
}

impl StubClassifier {
    /// Certain of `class` out of `0..num_classes`
    pub fn certain(class: i32, num_classes: i32) -> Self {
        let classes: Vec<i32> = (0..num_classes).collect();
        let probabilities = classes
            .iter()
            .map(|&c| if c == class { 1.0 } else { 0.0 })
            .collect();
        Self {
            classes,
            probabilities,
            seen: SeenRows::default(),
        }
    }

    pub fn seen(&self) -> SeenRows {
        self.seen.clone()
    }
}

impl Classifier for StubClassifier {
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<ClassProbabilities> {
        self.seen.lock().unwrap().push(features[0].clone());
        Ok(ClassProbabilities::new(
            self.classes.clone(),
            self.probabilities.clone(),
        ))
    }
}

/// A predictor around a stub, plus the rows it will see
pub fn stub_predictor(class: i32, num_classes: i32, threshold: f64) -> (CameraPredictor, SeenRows) {
    let stub = StubClassifier::certain(class, num_classes);
    let seen = stub.seen();
    (CameraPredictor::new(Box::new(stub), threshold), seen)
}
