//! Drift
//!
//! Online change detectors. A detector consumes one scalar per step and
//! reports whether the process that produced the values has changed.
//!
//! # Submodules
//!
//! * `stats`: Two-sample hypothesis tests returning p-values.
//! * `hypothesis`: Windowed hypothesis test detector.
//! * `ddm`: Drift Detection Method over a 0/1 error stream.
//! * `periodic`: Naive detector signalling at a fixed period.
//! * `ensemble`: One detector per attribute with vote fusion.
use crate::constants::VOTE_LENGTH;
use crate::errors::DriftError;
use serde::{Deserialize, Serialize};

pub mod ddm;
pub mod ensemble;
pub mod hypothesis;
pub mod periodic;
pub mod stats;

pub use ddm::DdmDetector;
pub use ensemble::{DetectorEnsemble, WarningAggregation};
pub use hypothesis::HypothesisTestDetector;
pub use periodic::PeriodicDetector;
pub use stats::StatisticalTest;

/// Snapshot of a detector's state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorOutput {
    /// A change has been detected on the latest input.
    pub is_change: bool,
    /// The detector is in its warning zone.
    pub is_warning: bool,
    /// Estimated number of inputs since the change actually happened.
    pub delay: f64,
    /// Implementation specific estimate of the monitored quantity.
    pub estimation: f64,
}

impl DetectorOutput {
    /// Vote vector `[change, warning, delay, estimation]` consumed by evaluators.
    pub fn to_votes(&self) -> [f64; VOTE_LENGTH] {
        [
            if self.is_change { 1.0 } else { 0.0 },
            if self.is_warning { 1.0 } else { 0.0 },
            self.delay,
            self.estimation,
        ]
    }

    pub fn from_votes(votes: &[f64]) -> Option<Self> {
        if votes.len() != VOTE_LENGTH {
            return None;
        }
        Some(DetectorOutput {
            is_change: votes[0] == 1.0,
            is_warning: votes[1] == 1.0,
            delay: votes[2],
            estimation: votes[3],
        })
    }
}

/// Stateful monitor of a scalar stream.
///
/// Implementations restart themselves on the first input after a change has
/// been signalled, so a caller never has to reset a detector explicitly.
/// A change always supersedes a warning: `change_detected` and `warning_zone`
/// are never both true.
pub trait ChangeDetector: Send {
    /// Clear all accumulated state.
    fn reset(&mut self);

    /// Consume one observation.
    fn input(&mut self, value: f64) -> Result<(), DriftError>;

    fn change_detected(&self) -> bool;

    fn warning_zone(&self) -> bool;

    fn delay(&self) -> f64 {
        0.0
    }

    fn estimation(&self) -> f64 {
        0.0
    }

    /// Current state, without mutating the detector.
    fn output(&self) -> DetectorOutput {
        let is_change = self.change_detected();
        DetectorOutput {
            is_change,
            is_warning: self.warning_zone() && !is_change,
            delay: self.delay(),
            estimation: self.estimation(),
        }
    }

    /// Approximate memory held by the detector, including its buffers.
    fn byte_size(&self) -> usize {
        std::mem::size_of_val(self)
    }

    /// Configuration summary, used when reporting failures.
    fn description(&self) -> String;

    /// Independent copy with its own state.
    fn clone_box(&self) -> Box<dyn ChangeDetector>;
}

impl Clone for Box<dyn ChangeDetector> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_votes() {
        let out = DetectorOutput {
            is_change: true,
            is_warning: false,
            delay: 2.0,
            estimation: 0.5,
        };
        assert_eq!(out.to_votes(), [1.0, 0.0, 2.0, 0.5]);
        assert_eq!(DetectorOutput::from_votes(&out.to_votes()), Some(out));
        assert_eq!(DetectorOutput::from_votes(&[0.3, 0.7]), None);
    }
}
