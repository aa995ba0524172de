//! Errors
//!
//! Custom error types used throughout the `driftwatch` crate.
use thiserror::Error;

/// Errors that can occur while detecting drift or evaluating a learner.
#[derive(Debug, Error)]
pub enum DriftError {
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// An input vector does not match the dimensionality fixed on first use.
    #[error("Input has {found} attributes, but the detector ensemble was built for {expected}.")]
    DimensionMismatch { expected: usize, found: usize },
    /// A statistical test could not produce a p-value for the supplied windows.
    #[error("Degenerate statistics: {0}")]
    DegenerateStatistics(String),
    /// Unable to write results to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read configuration from file.
    #[error("Unable to read from file {0}")]
    UnableToRead(String),
    /// A learner failed while the evaluation loop was processing an instance.
    #[error("Evaluation failed at instance {instance} using {learner}: {source}")]
    EvaluationFailed {
        instance: u64,
        learner: String,
        #[source]
        source: Box<DriftError>,
    },
}
