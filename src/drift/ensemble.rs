//! Detector Ensemble
//!
//! Applies one independent change detector per attribute of a vector stream
//! and fuses their votes. A change is reported when at least
//! `ceil(agreement_percentage * D / 100)` attribute detectors agree, so a
//! single noisy attribute cannot raise an alarm on its own.
use crate::drift::{ChangeDetector, DetectorOutput};
use crate::errors::DriftError;
use crate::utils::items_to_strings;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the per-attribute warning flags are combined.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningAggregation {
    /// Warning flag of the last attribute detector in index order.
    #[default]
    LastSeen,
    /// Same super-majority vote as used for changes.
    Vote,
}

impl FromStr for WarningAggregation {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LastSeen" => Ok(WarningAggregation::LastSeen),
            "Vote" => Ok(WarningAggregation::Vote),
            _ => Err(DriftError::ParseString(
                s.to_string(),
                "WarningAggregation".to_string(),
                items_to_strings(vec!["LastSeen", "Vote"]),
            )),
        }
    }
}

#[derive(Clone)]
pub struct DetectorEnsemble {
    prototype: Box<dyn ChangeDetector>,
    detectors: Vec<Box<dyn ChangeDetector>>,
    agreement_percentage: u32,
    warning_aggregation: WarningAggregation,
    parallel: bool,
    started: bool,
}

impl DetectorEnsemble {
    /// Create an ensemble whose attribute detectors are copies of `prototype`.
    ///
    /// * `agreement_percentage` - Percentage of attributes that must agree, at least 1.
    ///   Values above 100 make the ensemble unable to signal.
    pub fn new(prototype: Box<dyn ChangeDetector>, agreement_percentage: u32) -> Result<Self, DriftError> {
        if agreement_percentage == 0 {
            return Err(DriftError::InvalidParameter(
                "agreement_percentage".to_string(),
                "integer value of at least 1".to_string(),
                agreement_percentage.to_string(),
            ));
        }
        Ok(DetectorEnsemble {
            prototype,
            detectors: Vec::new(),
            agreement_percentage,
            warning_aggregation: WarningAggregation::default(),
            parallel: false,
            started: false,
        })
    }

    pub fn set_warning_aggregation(mut self, warning_aggregation: WarningAggregation) -> Self {
        self.warning_aggregation = warning_aggregation;
        self
    }

    /// Route attribute values to their detectors on the rayon thread pool.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Drop all attribute detectors; the next input sizes the ensemble again.
    pub fn reset(&mut self) {
        self.detectors.clear();
        self.started = false;
    }

    pub fn dimensions(&self) -> usize {
        self.detectors.len()
    }

    pub fn detectors(&self) -> &[Box<dyn ChangeDetector>] {
        &self.detectors
    }

    pub fn agreement_threshold(&self) -> usize {
        (self.agreement_percentage as usize * self.detectors.len()).div_ceil(100)
    }

    /// Feed one vector. The first vector only builds the attribute detectors.
    pub fn input(&mut self, values: &[f64]) -> Result<(), DriftError> {
        if !self.started {
            self.detectors = (0..values.len()).map(|_| self.prototype.clone_box()).collect();
            self.started = true;
            return Ok(());
        }
        if values.len() != self.detectors.len() {
            return Err(DriftError::DimensionMismatch {
                expected: self.detectors.len(),
                found: values.len(),
            });
        }

        let results: Vec<Result<(), DriftError>> = if self.parallel {
            self.detectors
                .par_iter_mut()
                .zip(values.par_iter())
                .map(|(d, v)| d.input(*v))
                .collect()
        } else {
            self.detectors
                .iter_mut()
                .zip(values.iter())
                .map(|(d, v)| d.input(*v))
                .collect()
        };
        // Report the lowest failing attribute regardless of scheduling.
        results.into_iter().collect::<Result<Vec<()>, DriftError>>()?;
        Ok(())
    }

    /// Fused output of the attribute detectors.
    pub fn output(&self) -> DetectorOutput {
        let d = self.detectors.len();
        if d == 0 {
            return DetectorOutput::default();
        }
        let threshold = self.agreement_threshold();
        let mut changes = 0;
        let mut warnings = 0;
        let mut last_warning = false;
        let mut delay = 0.0;
        let mut estimation = 0.0;
        for detector in &self.detectors {
            let out = detector.output();
            if out.is_change {
                changes += 1;
            }
            if out.is_warning {
                warnings += 1;
            }
            last_warning = out.is_warning;
            delay += out.delay;
            estimation += out.estimation;
        }

        let is_change = changes >= threshold;
        let is_warning = match self.warning_aggregation {
            WarningAggregation::LastSeen => last_warning,
            WarningAggregation::Vote => warnings >= threshold,
        };
        if is_change {
            info!("Change detected by {} of {} attribute detectors", changes, d);
        }
        DetectorOutput {
            is_change,
            is_warning: is_warning && !is_change,
            delay: delay / d as f64,
            estimation: estimation / d as f64,
        }
    }

    /// Approximate memory held by the attribute detectors and the prototype.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.prototype.byte_size()
            + self.detectors.iter().map(|d| d.byte_size()).sum::<usize>()
    }

    pub fn description(&self) -> String {
        format!(
            "DetectorEnsemble(detector={}, agreement_percentage={}, warning_aggregation={:?})",
            self.prototype.description(),
            self.agreement_percentage,
            self.warning_aggregation
        )
    }
}
