//! Stream
//!
//! Pull-based sources of instances. Streams used for drift evaluation also
//! publish where their concept drifts happen, so detections can be aligned
//! against the ground truth.
use crate::data::{Instance, Schema};
use crate::errors::DriftError;
use crate::utils::{validate_float_parameter, validate_positive_usize_parameter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait InstanceStream {
    fn schema(&self) -> Schema;

    fn has_more_instances(&self) -> bool;

    /// Next instance, or `None` once the stream is exhausted.
    fn next_instance(&mut self) -> Option<Instance>;

    /// Rewind to the first instance.
    fn restart(&mut self);
}

/// A stream with known drift locations.
pub trait ConceptDriftStream: InstanceStream {
    /// Ordered drift positions, as 1-based instance counts.
    fn drift_positions(&self) -> &[u64];

    /// Width of each drift, parallel to `drift_positions`. Zero is an abrupt drift.
    fn drift_widths(&self) -> &[u64];
}

fn validate_drifts(positions: &[u64], widths: &[u64]) -> Result<(), DriftError> {
    if positions.len() != widths.len() {
        return Err(DriftError::DimensionMismatch {
            expected: positions.len(),
            found: widths.len(),
        });
    }
    if positions.windows(2).any(|w| w[0] > w[1]) {
        return Err(DriftError::InvalidParameter(
            "drift_positions".to_string(),
            "ascending sequence".to_string(),
            format!("{:?}", positions),
        ));
    }
    Ok(())
}

/// Replays a fixed list of instances.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    schema: Schema,
    instances: Vec<Instance>,
    position: usize,
    drift_positions: Vec<u64>,
    drift_widths: Vec<u64>,
}

impl MemoryStream {
    pub fn new(schema: Schema, instances: Vec<Instance>) -> Self {
        MemoryStream {
            schema,
            instances,
            position: 0,
            drift_positions: Vec::new(),
            drift_widths: Vec::new(),
        }
    }

    /// Attach drift locations to the stream.
    pub fn with_drifts(mut self, positions: Vec<u64>, widths: Vec<u64>) -> Result<Self, DriftError> {
        validate_drifts(&positions, &widths)?;
        self.drift_positions = positions;
        self.drift_widths = widths;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl InstanceStream for MemoryStream {
    fn schema(&self) -> Schema {
        self.schema
    }

    fn has_more_instances(&self) -> bool {
        self.position < self.instances.len()
    }

    fn next_instance(&mut self) -> Option<Instance> {
        let instance = self.instances.get(self.position).cloned();
        if instance.is_some() {
            self.position += 1;
        }
        instance
    }

    fn restart(&mut self) {
        self.position = 0;
    }
}

impl ConceptDriftStream for MemoryStream {
    fn drift_positions(&self) -> &[u64] {
        &self.drift_positions
    }

    fn drift_widths(&self) -> &[u64] {
        &self.drift_widths
    }
}

/// Seeded binary classification stream with abrupt or gradual drifts.
///
/// Features are uniform on `[0, 1)` shifted by `concept * feature_shift`. The
/// label is 1 when the mean of the unshifted features exceeds 0.5, and the
/// rule is inverted in every odd concept. Around a drift of width `w` at
/// position `p` the new concept is chosen with probability
/// `1 / (1 + exp(-4 (t - p) / w))`.
#[derive(Debug, Clone)]
pub struct SyntheticDriftStream {
    num_features: usize,
    drift_positions: Vec<u64>,
    drift_widths: Vec<u64>,
    noise: f64,
    feature_shift: f64,
    max_instances: Option<u64>,
    seed: u64,
    rng: StdRng,
    processed: u64,
}

impl SyntheticDriftStream {
    pub fn new(
        num_features: usize,
        drift_positions: Vec<u64>,
        drift_widths: Vec<u64>,
        seed: u64,
    ) -> Result<Self, DriftError> {
        validate_positive_usize_parameter(num_features, "num_features")?;
        validate_drifts(&drift_positions, &drift_widths)?;
        Ok(SyntheticDriftStream {
            num_features,
            drift_positions,
            drift_widths,
            noise: 0.0,
            feature_shift: 0.0,
            max_instances: None,
            seed,
            rng: StdRng::seed_from_u64(seed),
            processed: 0,
        })
    }

    /// Probability of flipping each label.
    pub fn set_noise(mut self, noise: f64) -> Result<Self, DriftError> {
        validate_float_parameter(noise, 0.0, 1.0, "noise")?;
        self.noise = noise;
        Ok(self)
    }

    /// Offset added to every feature per concept, so drifts are visible in the inputs.
    pub fn set_feature_shift(mut self, feature_shift: f64) -> Self {
        self.feature_shift = feature_shift;
        self
    }

    pub fn set_max_instances(mut self, max_instances: Option<u64>) -> Self {
        self.max_instances = max_instances;
        self
    }

    fn probability_of_new_concept(t: u64, position: u64, width: u64) -> f64 {
        if width == 0 {
            return if t >= position { 1.0 } else { 0.0 };
        }
        let x = -4.0 * (t as f64 - position as f64) / width as f64;
        1.0 / (1.0 + x.exp())
    }

    /// Concept active at 1-based instance `t`.
    fn draw_concept(&mut self, t: u64) -> usize {
        let mut concept = 0;
        for (position, width) in self.drift_positions.iter().zip(self.drift_widths.iter()) {
            let p = Self::probability_of_new_concept(t, *position, *width);
            if self.rng.gen::<f64>() < p {
                concept += 1;
            } else {
                break;
            }
        }
        concept
    }
}

impl InstanceStream for SyntheticDriftStream {
    fn schema(&self) -> Schema {
        Schema::new(self.num_features, 2)
    }

    fn has_more_instances(&self) -> bool {
        self.max_instances.map_or(true, |max| self.processed < max)
    }

    fn next_instance(&mut self) -> Option<Instance> {
        if !self.has_more_instances() {
            return None;
        }
        self.processed += 1;
        let concept = self.draw_concept(self.processed);
        let base: Vec<f64> = (0..self.num_features).map(|_| self.rng.gen::<f64>()).collect();
        let mut label = base.iter().sum::<f64>() / self.num_features as f64 > 0.5;
        if concept % 2 == 1 {
            label = !label;
        }
        if self.noise > 0.0 && self.rng.gen::<f64>() < self.noise {
            label = !label;
        }
        let shift = concept as f64 * self.feature_shift;
        let features = base.into_iter().map(|v| v + shift).collect();
        Some(Instance::new(features, if label { 1.0 } else { 0.0 }))
    }

    fn restart(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.processed = 0;
    }
}

impl ConceptDriftStream for SyntheticDriftStream {
    fn drift_positions(&self) -> &[u64] {
        &self.drift_positions
    }

    fn drift_widths(&self) -> &[u64] {
        &self.drift_widths
    }
}
