//! Baseline Learners
//!
//! Small incremental classifiers used as champion, challenger, teacher or
//! student models.
use crate::data::Instance;
use crate::errors::DriftError;
use crate::learner::Learner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Smallest variance used for a feature, so that constant features do not
/// produce infinite densities.
const MIN_VARIANCE: f64 = 1e-9;

fn grow_to(v: &mut Vec<f64>, len: usize) {
    if v.len() < len {
        v.resize(len, 0.0);
    }
}

/// Predicts the class with the largest observed weight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MajorityClass {
    class_weights: Vec<f64>,
}

impl MajorityClass {
    pub fn new() -> Self {
        MajorityClass::default()
    }
}

impl Learner for MajorityClass {
    fn reset(&mut self) {
        self.class_weights.clear();
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        if let Some(class) = instance.class_index() {
            grow_to(&mut self.class_weights, class + 1);
            self.class_weights[class] += instance.weight;
        }
        Ok(())
    }

    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        self.class_weights.clone()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.class_weights.capacity() * std::mem::size_of::<f64>()
    }

    fn training_weight_seen(&self) -> f64 {
        self.class_weights.iter().sum()
    }

    fn description(&self) -> String {
        "MajorityClass".to_string()
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

/// Weighted running mean and variance of one feature within one class.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct GaussianEstimator {
    weight: f64,
    mean: f64,
    m2: f64,
}

impl GaussianEstimator {
    fn add(&mut self, value: f64, weight: f64) {
        self.weight += weight;
        let delta = value - self.mean;
        self.mean += weight * delta / self.weight;
        self.m2 += weight * delta * (value - self.mean);
    }

    fn variance(&self) -> f64 {
        if self.weight > 1.0 {
            (self.m2 / (self.weight - 1.0)).max(MIN_VARIANCE)
        } else {
            1.0
        }
    }

    fn log_density(&self, value: f64) -> f64 {
        let var = self.variance();
        -0.5 * ((2.0 * PI * var).ln() + (value - self.mean).powi(2) / var)
    }
}

/// Incremental Gaussian naive Bayes classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NaiveBayes {
    class_weights: Vec<f64>,
    // [class][feature]
    estimators: Vec<Vec<GaussianEstimator>>,
}

impl NaiveBayes {
    pub fn new() -> Self {
        NaiveBayes::default()
    }
}

impl Learner for NaiveBayes {
    fn reset(&mut self) {
        self.class_weights.clear();
        self.estimators.clear();
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        let class = match instance.class_index() {
            Some(c) => c,
            None => return Ok(()),
        };
        if instance.weight <= 0.0 {
            return Ok(());
        }
        grow_to(&mut self.class_weights, class + 1);
        if self.estimators.len() < class + 1 {
            self.estimators.resize(class + 1, Vec::new());
        }
        self.class_weights[class] += instance.weight;
        let estimators = &mut self.estimators[class];
        if estimators.len() < instance.features.len() {
            estimators.resize(instance.features.len(), GaussianEstimator::default());
        }
        for (est, value) in estimators.iter_mut().zip(instance.features.iter()) {
            if !value.is_nan() {
                est.add(*value, instance.weight);
            }
        }
        Ok(())
    }

    /// Posterior class probabilities.
    fn predict(&self, instance: &Instance) -> Vec<f64> {
        let total: f64 = self.class_weights.iter().sum();
        if total <= 0.0 {
            return Vec::new();
        }
        let log_posteriors: Vec<f64> = self
            .class_weights
            .iter()
            .zip(self.estimators.iter())
            .map(|(w, estimators)| {
                if *w <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                let mut lp = (w / total).ln();
                for (est, value) in estimators.iter().zip(instance.features.iter()) {
                    if !value.is_nan() {
                        lp += est.log_density(*value);
                    }
                }
                lp
            })
            .collect();
        let max = log_posteriors.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = log_posteriors.iter().map(|lp| (lp - max).exp()).collect();
        let norm: f64 = exp.iter().sum();
        exp.into_iter().map(|e| e / norm).collect()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.class_weights.capacity() * std::mem::size_of::<f64>()
            + self
                .estimators
                .iter()
                .map(|e| std::mem::size_of::<Vec<GaussianEstimator>>() + e.capacity() * std::mem::size_of::<GaussianEstimator>())
                .sum::<usize>()
    }

    fn training_weight_seen(&self) -> f64 {
        self.class_weights.iter().sum()
    }

    fn description(&self) -> String {
        "NaiveBayes".to_string()
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}
