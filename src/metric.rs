use serde::{Deserialize, Serialize};

/// Named value reported by a learner or an evaluator.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Measurement {
    pub name: String,
    pub value: f64,
}

impl Measurement {
    pub fn new(name: &str, value: f64) -> Self {
        Measurement {
            name: name.to_string(),
            value,
        }
    }
}

/// Look up a measurement by name.
pub fn find_measurement<'a>(measurements: &'a [Measurement], name: &str) -> Option<&'a Measurement> {
    measurements.iter().find(|m| m.name == name)
}
