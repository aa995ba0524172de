//! Learners
//!
//! The `Learner` trait is the narrow contract the drift machinery needs from a
//! predictive model. The adaptive learners in this module wrap other learners
//! and publish the vote vector of their change detector instead of class scores.
//!
//! # Submodules
//!
//! * `baseline`: Majority class and incremental Gaussian naive Bayes.
//! * `adaptive`: Champion/challenger switching driven by a change detector.
//! * `studd`: Teacher/student disagreement drift learner.
//! * `detector`: Adapters exposing a detector or detector ensemble as a learner.
use crate::data::Instance;
use crate::errors::DriftError;
use crate::metric::Measurement;

pub mod adaptive;
pub mod baseline;
pub mod detector;
pub mod studd;

pub use adaptive::{DetectionCounters, DriftAdaptiveClassifier, DriftLevel};
pub use baseline::{MajorityClass, NaiveBayes};
pub use detector::{MultivariateDetectorLearner, UnivariateDetectorLearner};
pub use studd::{StuddLearner, StuddMode};

/// An online model trained one instance at a time.
pub trait Learner: Send {
    /// Forget everything learned so far.
    fn reset(&mut self);

    /// Update the model with one instance. Instances without a label are ignored
    /// by learners that need one.
    fn train(&mut self, instance: &Instance) -> Result<(), DriftError>;

    /// Votes for the instance. For classifiers the arg-max is the predicted class.
    fn predict(&self, instance: &Instance) -> Vec<f64>;

    /// Approximate memory footprint in bytes.
    fn byte_size(&self) -> usize;

    /// Sum of the weights of the instances the model has been trained on.
    fn training_weight_seen(&self) -> f64;

    /// Model specific measurements for the learning curve.
    fn model_measurements(&mut self) -> Vec<Measurement> {
        Vec::new()
    }

    fn description(&self) -> String;

    /// Independent deep copy.
    fn box_clone(&self) -> Box<dyn Learner>;
}

impl Clone for Box<dyn Learner> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
