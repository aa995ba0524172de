//! Evaluation
//!
//! Online evaluation of drift-aware learners against streams with known
//! drift locations.
//!
//! # Submodules
//!
//! * `evaluator`: Detection delay accounting.
//! * `curve`: Learning curve snapshots and their export.
//! * `harness`: Partially labelled and delayed-label evaluation loops.
use crate::data::Instance;
use crate::metric::Measurement;

pub mod curve;
pub mod evaluator;
pub mod harness;

#[cfg(test)]
mod tests;

pub use curve::{LearningCurve, LearningEvaluation};
pub use evaluator::ConceptDriftEvaluator;
pub use harness::{find_ground_truth, DriftPositionMode, EvaluationHarness, LabelingMode};

/// Accumulates performance figures from the votes a learner produces.
pub trait PerformanceEvaluator: Send {
    fn reset(&mut self);

    /// Record the votes for one instance.
    ///
    /// * `ground_truth` - 1 when a true drift happens at this instance, 0 otherwise.
    fn add_result(&mut self, instance: &Instance, ground_truth: u8, votes: &[f64]);

    fn performance_measurements(&self) -> Vec<Measurement>;
}
