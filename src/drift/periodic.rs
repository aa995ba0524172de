//! Periodic Detector
//!
//! Control detector that ignores its input and signals a change every
//! `reset_instances` inputs.
use crate::constants::DEFAULT_RESET_INSTANCES;
use crate::drift::ChangeDetector;
use crate::errors::DriftError;
use crate::utils::validate_positive_usize_parameter;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicDetector {
    reset_instances: usize,
    num_instances: usize,
    initialized: bool,
    change: bool,
}

impl Default for PeriodicDetector {
    fn default() -> Self {
        PeriodicDetector {
            reset_instances: DEFAULT_RESET_INSTANCES,
            num_instances: 0,
            initialized: false,
            change: false,
        }
    }
}

impl PeriodicDetector {
    pub fn new(reset_instances: usize) -> Result<Self, DriftError> {
        validate_positive_usize_parameter(reset_instances, "reset_instances")?;
        Ok(PeriodicDetector {
            reset_instances,
            ..Default::default()
        })
    }
}

impl ChangeDetector for PeriodicDetector {
    fn reset(&mut self) {
        self.num_instances = 0;
        self.change = false;
    }

    fn input(&mut self, _value: f64) -> Result<(), DriftError> {
        if self.change || !self.initialized {
            self.reset();
            self.initialized = true;
        }
        if self.num_instances >= self.reset_instances {
            self.change = true;
        } else {
            self.num_instances += 1;
        }
        Ok(())
    }

    fn change_detected(&self) -> bool {
        self.change
    }

    fn warning_zone(&self) -> bool {
        false
    }

    fn description(&self) -> String {
        format!("PeriodicDetector(reset_instances={})", self.reset_instances)
    }

    fn clone_box(&self) -> Box<dyn ChangeDetector> {
        Box::new(self.clone())
    }
}
