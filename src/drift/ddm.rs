//! Drift Detection Method (DDM)
//!
//! Monitors the running error rate `p` of a 0/1 prediction error stream and its
//! standard deviation `s`. When `p + s` rises above the recorded minimum by
//! `warning_level` (resp. `out_control_level`) standard deviations the
//! detector enters the warning zone (resp. signals a change).
use crate::constants::{DDM_MIN_INSTANCES, DDM_OUT_CONTROL_LEVEL, DDM_WARNING_LEVEL};
use crate::drift::ChangeDetector;
use crate::errors::DriftError;
use crate::utils::{validate_float_parameter, validate_positive_usize_parameter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdmDetector {
    min_instances: usize,
    warning_level: f64,
    out_control_level: f64,
    n: usize,
    p: f64,
    s: f64,
    p_min: f64,
    s_min: f64,
    initialized: bool,
    change: bool,
    warning: bool,
}

impl Default for DdmDetector {
    fn default() -> Self {
        let mut detector = DdmDetector {
            min_instances: DDM_MIN_INSTANCES,
            warning_level: DDM_WARNING_LEVEL,
            out_control_level: DDM_OUT_CONTROL_LEVEL,
            n: 0,
            p: 1.0,
            s: 0.0,
            p_min: f64::MAX,
            s_min: f64::MAX,
            initialized: false,
            change: false,
            warning: false,
        };
        detector.reset();
        detector
    }
}

impl DdmDetector {
    pub fn new(min_instances: usize, warning_level: f64, out_control_level: f64) -> Result<Self, DriftError> {
        validate_positive_usize_parameter(min_instances, "min_instances")?;
        validate_float_parameter(warning_level, 0.0, f64::MAX, "warning_level")?;
        validate_float_parameter(out_control_level, warning_level, f64::MAX, "out_control_level")?;
        Ok(DdmDetector {
            min_instances,
            warning_level,
            out_control_level,
            ..Default::default()
        })
    }

    /// Running error rate.
    pub fn error_rate(&self) -> f64 {
        self.p
    }
}

impl ChangeDetector for DdmDetector {
    fn reset(&mut self) {
        self.n = 1;
        self.p = 1.0;
        self.s = 0.0;
        self.p_min = f64::MAX;
        self.s_min = f64::MAX;
        self.change = false;
        self.warning = false;
    }

    /// `value` is the prediction error, 1.0 for a mistake and 0.0 otherwise.
    fn input(&mut self, value: f64) -> Result<(), DriftError> {
        if self.change || !self.initialized {
            self.reset();
            self.initialized = true;
        }

        self.p += (value - self.p) / self.n as f64;
        self.s = (self.p * (1.0 - self.p) / self.n as f64).sqrt();
        self.n += 1;

        self.warning = false;
        if self.n < self.min_instances {
            return Ok(());
        }

        if self.p + self.s <= self.p_min + self.s_min {
            self.p_min = self.p;
            self.s_min = self.s;
        }

        if self.p + self.s > self.p_min + self.out_control_level * self.s_min {
            self.change = true;
        } else if self.p + self.s > self.p_min + self.warning_level * self.s_min {
            self.warning = true;
        }
        Ok(())
    }

    fn change_detected(&self) -> bool {
        self.change
    }

    fn warning_zone(&self) -> bool {
        self.warning
    }

    fn estimation(&self) -> f64 {
        self.p
    }

    fn description(&self) -> String {
        format!(
            "DdmDetector(min_instances={}, warning_level={}, out_control_level={})",
            self.min_instances, self.warning_level, self.out_control_level
        )
    }

    fn clone_box(&self) -> Box<dyn ChangeDetector> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_error_rate_increase() {
        let mut detector = DdmDetector::default();
        // One mistake in ten.
        for i in 0..1000 {
            let err = if i % 10 == 0 { 1.0 } else { 0.0 };
            detector.input(err).unwrap();
            assert!(!detector.change_detected());
        }

        let mut warned = false;
        let mut changed_at = None;
        // Three mistakes in five.
        for i in 0..1000 {
            let err = if i % 5 < 3 { 1.0 } else { 0.0 };
            detector.input(err).unwrap();
            assert!(!(detector.change_detected() && detector.warning_zone()));
            warned |= detector.warning_zone();
            if detector.change_detected() {
                changed_at = Some(i);
                break;
            }
        }
        assert!(warned);
        assert!(changed_at.is_some());
    }

    #[test]
    fn test_restart_after_change() {
        let mut detector = DdmDetector::new(5, 2.0, 3.0).unwrap();
        for _ in 0..50 {
            detector.input(0.0).unwrap();
        }
        let mut fired = false;
        for _ in 0..50 {
            detector.input(1.0).unwrap();
            if detector.change_detected() {
                fired = true;
                break;
            }
        }
        assert!(fired);
        detector.input(0.0).unwrap();
        assert!(!detector.change_detected());
        assert_eq!(detector.error_rate(), 0.0);
    }

    #[test]
    fn test_invalid_levels() {
        assert!(DdmDetector::new(30, 3.0, 2.0).is_err());
        assert!(DdmDetector::new(0, 2.0, 3.0).is_err());
    }
}
