// Modules
pub mod config;
pub mod constants;
pub mod data;
pub mod drift;
pub mod errors;
pub mod evaluation;
pub mod learner;
pub mod metric;
pub mod sampler;
pub mod stream;
pub mod utils;

// Individual classes, and functions
pub use config::ExperimentConfig;
pub use data::{Instance, Schema};
pub use drift::{ChangeDetector, DetectorEnsemble, DetectorOutput, HypothesisTestDetector, StatisticalTest};
pub use errors::DriftError;
pub use evaluation::{ConceptDriftEvaluator, EvaluationHarness, LearningCurve};
pub use learner::{DriftAdaptiveClassifier, Learner, StuddLearner};
