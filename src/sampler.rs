//! Sampler
//!
//! Strategies deciding which stream instances reveal their label to the
//! learner, used to simulate partially labelled streams.
use crate::errors::DriftError;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

// A sampler decides, one instance at a time, whether the label is available.
pub trait LabelSampler {
    /// Returns true when the next instance should be used for training.
    fn is_labelled(&mut self, rng: &mut StdRng) -> bool;
}

/// Withholds labels uniformly at random.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RandomLabelSampler {
    percentage_unlabelled: u32,
}

impl RandomLabelSampler {
    /// * `percentage_unlabelled` - Percentage of instances whose label is withheld, 0 to 100.
    pub fn new(percentage_unlabelled: u32) -> Result<Self, DriftError> {
        if percentage_unlabelled > 100 {
            return Err(DriftError::InvalidParameter(
                "percentage_unlabelled".to_string(),
                "integer value between 0 and 100".to_string(),
                percentage_unlabelled.to_string(),
            ));
        }
        Ok(RandomLabelSampler { percentage_unlabelled })
    }

    pub fn percentage_unlabelled(&self) -> u32 {
        self.percentage_unlabelled
    }
}

impl LabelSampler for RandomLabelSampler {
    fn is_labelled(&mut self, rng: &mut StdRng) -> bool {
        rng.gen_range(0..100) >= self.percentage_unlabelled
    }
}
