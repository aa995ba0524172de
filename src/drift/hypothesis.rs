//! Hypothesis Test Detector
//!
//! Keeps the latest `2 * window_size` inputs, compares the older half
//! (reference) against the newer half (test) with a two-sample test and
//! signals a change when the p-value falls below the threshold.
use crate::drift::stats::{test_callable, StatisticalTest};
use crate::drift::ChangeDetector;
use crate::errors::DriftError;
use crate::constants::MAX_WINDOW_SIZE;
use crate::utils::{mean, validate_float_parameter, validate_usize_parameter};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisTestDetector {
    test: StatisticalTest,
    window_size: usize,
    threshold: f64,
    buffer: Vec<f64>,
    initialized: bool,
    change: bool,
    warning: bool,
    estimation: f64,
    last_p_value: Option<f64>,
}

impl HypothesisTestDetector {
    /// Create a new detector.
    ///
    /// * `test` - Hypothesis test comparing the reference and test windows.
    /// * `window_size` - Number of inputs in each window, between 1 and `MAX_WINDOW_SIZE`.
    /// * `threshold` - p-value cutoff in `[0, 1]`.
    pub fn new(test: StatisticalTest, window_size: usize, threshold: f64) -> Result<Self, DriftError> {
        validate_usize_parameter(window_size, 1, MAX_WINDOW_SIZE, "window_size")?;
        validate_float_parameter(threshold, 0.0, 1.0, "threshold")?;
        let mut detector = HypothesisTestDetector {
            test,
            window_size,
            threshold,
            buffer: Vec::with_capacity(2 * window_size + 1),
            initialized: false,
            change: false,
            warning: false,
            estimation: 0.0,
            last_p_value: None,
        };
        detector.reset();
        Ok(detector)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// p-value of the most recent evaluation.
    pub fn last_p_value(&self) -> Option<f64> {
        self.last_p_value
    }

    fn evaluate(&mut self) -> Result<(), DriftError> {
        let len = self.buffer.len();
        let split = len - self.window_size;
        let reference = &self.buffer[len - 2 * self.window_size..split];
        let test = &self.buffer[split..];

        let p_value = test_callable(&self.test)(reference, test)?;
        self.estimation = mean(test) - mean(reference);
        self.last_p_value = Some(p_value);
        if p_value < self.threshold {
            debug!("{} rejected the null hypothesis, p-value {:.6}", self.test, p_value);
            self.change = true;
        }
        // The test half becomes the next reference.
        self.buffer.drain(..split);
        Ok(())
    }
}

impl ChangeDetector for HypothesisTestDetector {
    fn reset(&mut self) {
        self.buffer.clear();
        self.change = false;
        self.warning = false;
        self.estimation = 0.0;
        self.last_p_value = None;
    }

    fn input(&mut self, value: f64) -> Result<(), DriftError> {
        if self.change || !self.initialized {
            self.reset();
            self.initialized = true;
        }

        self.buffer.push(value);
        if self.buffer.len() > 2 * self.window_size {
            if let Err(e) = self.evaluate() {
                self.reset();
                self.initialized = false;
                return Err(e);
            }
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
        self.estimation
    }

    fn byte_size(&self) -> usize {
        // Clones start with an empty allocation that grows back to the window bound.
        let slots = self.buffer.capacity().max(2 * self.window_size + 1);
        std::mem::size_of::<Self>() + slots * std::mem::size_of::<f64>()
    }

    fn description(&self) -> String {
        format!(
            "HypothesisTestDetector(test={}, window_size={}, threshold={})",
            self.test, self.window_size, self.threshold
        )
    }

    fn clone_box(&self) -> Box<dyn ChangeDetector> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand::distributions::Distribution;
    use statrs::distribution::Normal;

    fn feed(detector: &mut HypothesisTestDetector, values: &[f64]) -> bool {
        let mut fired = false;
        for v in values {
            detector.input(*v).unwrap();
            fired |= detector.change_detected();
        }
        fired
    }

    #[test]
    fn test_reset_state() {
        let mut detector = HypothesisTestDetector::new(StatisticalTest::Ks, 5, 0.05).unwrap();
        assert!(!detector.change_detected());
        assert!(!detector.warning_zone());
        assert_eq!(detector.buffered(), 0);

        detector.input(1.0).unwrap();
        detector.reset();
        detector.reset();
        assert!(!detector.change_detected());
        assert_eq!(detector.buffered(), 0);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(HypothesisTestDetector::new(StatisticalTest::Ks, 0, 0.05).is_err());
        assert!(HypothesisTestDetector::new(StatisticalTest::Ks, 10, 1.5).is_err());
        let huge = HypothesisTestDetector::new(StatisticalTest::Ks, usize::MAX, 0.05);
        assert!(matches!(huge, Err(DriftError::InvalidParameter(..))));
        assert!(HypothesisTestDetector::new(StatisticalTest::Ks, MAX_WINDOW_SIZE + 1, 0.05).is_err());
    }

    #[test]
    fn test_no_signal_before_full_windows() {
        let w = 10;
        let mut detector = HypothesisTestDetector::new(StatisticalTest::Ks, w, 1.0).unwrap();
        // Threshold 1.0 rejects on any p-value below one, so only the warm up prevents a signal.
        let values: Vec<f64> = (0..2 * w).map(|i| if i < w { 0.0 } else { 100.0 + i as f64 }).collect();
        assert!(!feed(&mut detector, &values));
        assert_eq!(detector.buffered(), 2 * w);
        assert!(detector.last_p_value().is_none());

        detector.input(500.0).unwrap();
        assert!(detector.last_p_value().is_some());
        assert!(detector.change_detected());
        assert_eq!(detector.buffered(), w);
    }

    #[test]
    fn test_buffer_collapse() {
        let w = 4;
        let mut detector = HypothesisTestDetector::new(StatisticalTest::TTest, w, 0.0).unwrap();
        let values: Vec<f64> = (0..(2 * w + 1)).map(|i| i as f64).collect();
        assert!(!feed(&mut detector, &values));
        assert_eq!(detector.buffered(), w);
        // w + 1 more inputs are needed before the next evaluation
        for i in 0..w {
            detector.input(i as f64 * 0.5).unwrap();
        }
        assert_eq!(detector.buffered(), 2 * w);
        detector.input(1.0).unwrap();
        assert_eq!(detector.buffered(), w);
    }

    #[test]
    fn test_self_healing_restart() {
        let w = 5;
        let mut detector = HypothesisTestDetector::new(StatisticalTest::Ks, w, 0.05).unwrap();
        let mut values = vec![0.0; w + 1];
        values.extend(vec![10.0; w]);
        assert!(feed(&mut detector, &values));
        assert!(detector.change_detected());

        detector.input(0.0).unwrap();
        assert!(!detector.change_detected());
        assert_eq!(detector.buffered(), 1);
    }

    #[test]
    fn test_degenerate_windows_propagate() {
        let w = 3;
        let mut detector = HypothesisTestDetector::new(StatisticalTest::WilcoxonRankSum, w, 0.05).unwrap();
        for _ in 0..2 * w {
            detector.input(1.0).unwrap();
        }
        let res = detector.input(1.0);
        assert!(matches!(res, Err(DriftError::DegenerateStatistics(_))));
        assert_eq!(detector.buffered(), 0);
        assert!(!detector.change_detected());
    }

    #[test]
    fn test_output_is_idempotent() {
        let mut detector = HypothesisTestDetector::new(StatisticalTest::Ks, 3, 0.05).unwrap();
        for v in [0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0] {
            detector.input(v).unwrap();
        }
        let first = detector.output();
        assert_eq!(first, detector.output());
        assert_eq!(first, detector.output());
        assert!(first.is_change);
        assert_eq!(first.estimation, 5.0);
    }

    fn trial_rates(test: StatisticalTest, shift: f64) -> f64 {
        let w = 50;
        let trials = 1000;
        let mut rng = StdRng::seed_from_u64(1903);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut detections = 0;
        for _ in 0..trials {
            let mut detector = HypothesisTestDetector::new(test, w, 0.01).unwrap();
            // The first input is never part of a window.
            let mut values: Vec<f64> = (0..w + 1).map(|_| normal.sample(&mut rng)).collect();
            values.extend((0..w).map(|_| normal.sample(&mut rng) + shift));
            if feed(&mut detector, &values) {
                detections += 1;
            }
        }
        detections as f64 / trials as f64
    }

    #[test]
    fn test_false_positive_rate() {
        for test in [StatisticalTest::Ks, StatisticalTest::WilcoxonRankSum, StatisticalTest::TTest] {
            let rate = trial_rates(test, 0.0);
            assert!(rate < 0.025, "{} false positive rate {}", test, rate);
        }
    }

    #[test]
    fn test_mean_shift_detection() {
        for test in [StatisticalTest::Ks, StatisticalTest::WilcoxonRankSum, StatisticalTest::TTest] {
            let rate = trial_rates(test, 4.0);
            assert!(rate > 0.99, "{} detection rate {}", test, rate);
        }
    }
}
