//! Concept Drift Evaluator
//!
//! Aligns detector votes with ground-truth drift markers and accumulates the
//! detection delay. A drift stays open from its ground-truth marker until the
//! first change vote, which closes it and contributes
//! `instances since the marker - reported delay` to the total delay.
use crate::data::Instance;
use crate::drift::DetectorOutput;
use crate::evaluation::PerformanceEvaluator;
use crate::metric::Measurement;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptDriftEvaluator {
    weight_observed: f64,
    number_detections: f64,
    number_detections_occurred: f64,
    number_changes: f64,
    number_warnings: f64,
    delay: f64,
    total_delay: f64,
    in_warning_zone: bool,
    input_value: f64,
    change_occurred: bool,
}

impl ConceptDriftEvaluator {
    pub fn new() -> Self {
        ConceptDriftEvaluator::default()
    }

    /// Total weight of the evaluated instances, 1 when nothing was evaluated yet.
    pub fn total_weight_observed(&self) -> f64 {
        if self.weight_observed > 0.0 {
            self.weight_observed
        } else {
            1.0
        }
    }

    pub fn number_detections(&self) -> f64 {
        self.number_detections
    }

    /// Detections that closed an open drift.
    pub fn number_detections_occurred(&self) -> f64 {
        self.number_detections_occurred
    }

    pub fn number_changes(&self) -> f64 {
        self.number_changes
    }

    pub fn number_warnings(&self) -> f64 {
        self.number_warnings
    }

    pub fn total_delay(&self) -> f64 {
        self.total_delay
    }

    /// Whether a ground-truth drift is waiting for a detection.
    pub fn change_occurred(&self) -> bool {
        self.change_occurred
    }
}

impl PerformanceEvaluator for ConceptDriftEvaluator {
    fn reset(&mut self) {
        *self = ConceptDriftEvaluator::default();
    }

    fn add_result(&mut self, instance: &Instance, ground_truth: u8, votes: &[f64]) {
        self.input_value = instance.target.map_or(0.0, |t| t.trunc());
        let output = match DetectorOutput::from_votes(votes) {
            Some(output) if instance.weight > 0.0 => output,
            _ => return,
        };
        self.delay += 1.0;
        self.weight_observed += instance.weight;

        if output.is_change {
            self.number_detections += instance.weight;
            if self.change_occurred {
                let delay = self.delay - output.delay;
                info!("Drift detected {} instances after it occurred", delay);
                self.total_delay += delay;
                self.number_detections_occurred += instance.weight;
                self.change_occurred = false;
            } else {
                info!("Change detected without an open drift");
            }
        }

        if self.change_occurred && output.is_warning {
            if !self.in_warning_zone {
                self.number_warnings += instance.weight;
                self.in_warning_zone = true;
            }
        } else {
            self.in_warning_zone = false;
        }

        if ground_truth == 1 {
            self.number_changes += instance.weight;
            self.delay = 0.0;
            self.change_occurred = true;
        }
    }

    fn performance_measurements(&self) -> Vec<Measurement> {
        vec![
            Measurement::new("learned instances", self.total_weight_observed()),
            Measurement::new("detected changes", self.number_detections),
            Measurement::new("detected warnings", self.number_warnings),
            Measurement::new("true changes", self.number_changes),
            Measurement::new("delay detection (average)", self.total_delay / self.number_changes),
            Measurement::new(
                "delay true detection (average)",
                self.total_delay / self.number_detections,
            ),
            Measurement::new("true changes detected", self.number_detections_occurred),
            Measurement::new("input values", self.input_value),
        ]
    }
}
