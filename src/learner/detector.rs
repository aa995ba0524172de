//! Detector Learners
//!
//! Adapters that let a bare change detector, or a detector ensemble, be
//! driven by the evaluation harness like any other learner. Both publish the
//! detector vote vector from `predict`.
use crate::data::Instance;
use crate::drift::{ChangeDetector, DetectorEnsemble};
use crate::errors::DriftError;
use crate::learner::Learner;

/// Feeds each instance's target value to a single detector.
#[derive(Clone)]
pub struct UnivariateDetectorLearner {
    prototype: Box<dyn ChangeDetector>,
    detector: Box<dyn ChangeDetector>,
    weight_seen: f64,
}

impl UnivariateDetectorLearner {
    pub fn new(prototype: Box<dyn ChangeDetector>) -> Self {
        let detector = prototype.clone_box();
        UnivariateDetectorLearner {
            prototype,
            detector,
            weight_seen: 0.0,
        }
    }

    pub fn detector(&self) -> &dyn ChangeDetector {
        self.detector.as_ref()
    }
}

impl Learner for UnivariateDetectorLearner {
    fn reset(&mut self) {
        self.detector = self.prototype.clone_box();
        self.detector.reset();
        self.weight_seen = 0.0;
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        if let Some(target) = instance.target {
            self.detector.input(target)?;
            self.weight_seen += instance.weight;
        }
        Ok(())
    }

    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        self.detector.output().to_votes().to_vec()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.detector.byte_size()
    }

    fn training_weight_seen(&self) -> f64 {
        self.weight_seen
    }

    fn description(&self) -> String {
        format!("UnivariateDetectorLearner(detector={})", self.prototype.description())
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

/// Feeds each instance's feature vector to a detector ensemble.
#[derive(Clone)]
pub struct MultivariateDetectorLearner {
    prototype: DetectorEnsemble,
    ensemble: DetectorEnsemble,
    weight_seen: f64,
}

impl MultivariateDetectorLearner {
    pub fn new(ensemble: DetectorEnsemble) -> Self {
        let mut fresh = ensemble.clone();
        fresh.reset();
        MultivariateDetectorLearner {
            prototype: ensemble,
            ensemble: fresh,
            weight_seen: 0.0,
        }
    }

    pub fn ensemble(&self) -> &DetectorEnsemble {
        &self.ensemble
    }
}

impl Learner for MultivariateDetectorLearner {
    fn reset(&mut self) {
        self.ensemble = self.prototype.clone();
        self.ensemble.reset();
        self.weight_seen = 0.0;
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        self.ensemble.input(&instance.features)?;
        self.weight_seen += instance.weight;
        Ok(())
    }

    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        self.ensemble.output().to_votes().to_vec()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.ensemble.byte_size()
    }

    fn training_weight_seen(&self) -> f64 {
        self.weight_seen
    }

    fn description(&self) -> String {
        format!("MultivariateDetectorLearner(ensemble={})", self.prototype.description())
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::{HypothesisTestDetector, PeriodicDetector, StatisticalTest};

    #[test]
    fn test_univariate_feeds_target() {
        let mut learner = UnivariateDetectorLearner::new(Box::new(PeriodicDetector::new(2).unwrap()));
        let mut changes = Vec::new();
        for _ in 0..4 {
            learner.train(&Instance::new(vec![9.0], 1.0)).unwrap();
            changes.push(learner.predict(&Instance::unlabelled(vec![]))[0]);
        }
        learner.train(&Instance::unlabelled(vec![9.0])).unwrap();
        assert_eq!(changes, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(learner.training_weight_seen(), 4.0);

        learner.reset();
        assert_eq!(learner.training_weight_seen(), 0.0);
        assert!(!learner.detector().change_detected());
    }

    #[test]
    fn test_multivariate_feeds_features() {
        let ensemble = DetectorEnsemble::new(Box::new(PeriodicDetector::new(1).unwrap()), 100).unwrap();
        let mut learner = MultivariateDetectorLearner::new(ensemble);
        learner.train(&Instance::new(vec![0.0, 0.0], 0.0)).unwrap();
        assert_eq!(learner.ensemble().dimensions(), 2);
        learner.train(&Instance::new(vec![0.0, 0.0], 0.0)).unwrap();
        learner.train(&Instance::new(vec![0.0, 0.0], 0.0)).unwrap();
        assert_eq!(learner.predict(&Instance::unlabelled(vec![]))[0], 1.0);

        let err = learner.train(&Instance::new(vec![0.0], 0.0));
        assert!(matches!(err, Err(DriftError::DimensionMismatch { .. })));

        learner.reset();
        assert_eq!(learner.ensemble().dimensions(), 0);
    }

    #[test]
    fn test_byte_size_counts_detector_windows() {
        let window = HypothesisTestDetector::new(StatisticalTest::Ks, 50, 0.01).unwrap();
        let window_bytes = 100 * std::mem::size_of::<f64>();

        let univariate = UnivariateDetectorLearner::new(Box::new(window.clone()));
        assert!(univariate.byte_size() >= std::mem::size_of::<UnivariateDetectorLearner>() + window_bytes);

        let mut multivariate = MultivariateDetectorLearner::new(DetectorEnsemble::new(Box::new(window), 60).unwrap());
        let empty = multivariate.byte_size();
        multivariate.train(&Instance::new(vec![0.0, 0.0, 0.0], 0.0)).unwrap();
        assert!(multivariate.byte_size() >= empty + 3 * window_bytes);
    }
}
