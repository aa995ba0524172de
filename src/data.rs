//! Data
//!
//! Instance and schema types passed between streams, learners and evaluators.
use serde::{Deserialize, Serialize};

/// Shape of the instances produced by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Number of input attributes, excluding the target.
    pub num_features: usize,
    /// Number of classes of the target, 0 for a numeric target.
    pub num_classes: usize,
}

impl Schema {
    pub fn new(num_features: usize, num_classes: usize) -> Self {
        Schema {
            num_features,
            num_classes,
        }
    }
}

/// A single observation from a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Attribute values.
    pub features: Vec<f64>,
    /// Class index or numeric target, `None` when the label is withheld.
    pub target: Option<f64>,
    /// Instance weight.
    pub weight: f64,
}

impl Instance {
    /// Create a labelled instance with unit weight.
    pub fn new(features: Vec<f64>, target: f64) -> Self {
        Instance {
            features,
            target: Some(target),
            weight: 1.0,
        }
    }

    /// Create an instance without a label.
    pub fn unlabelled(features: Vec<f64>) -> Self {
        Instance {
            features,
            target: None,
            weight: 1.0,
        }
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn is_labelled(&self) -> bool {
        self.target.is_some()
    }

    /// Target interpreted as a class index.
    pub fn class_index(&self) -> Option<usize> {
        self.target.filter(|t| t.is_finite() && *t >= 0.0).map(|t| t as usize)
    }

    /// Copy of this instance with the label removed.
    pub fn without_label(&self) -> Instance {
        Instance {
            features: self.features.clone(),
            target: None,
            weight: self.weight,
        }
    }

    /// Copy of this instance relabelled with `target`.
    pub fn relabelled(&self, target: f64) -> Instance {
        Instance {
            features: self.features.clone(),
            target: Some(target),
            weight: self.weight,
        }
    }

    /// Approximate heap and inline size in bytes.
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Instance>() + self.features.capacity() * std::mem::size_of::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let inst = Instance::new(vec![1.0, 2.0], 1.0);
        assert_eq!(inst.class_index(), Some(1));
        assert_eq!(inst.num_features(), 2);

        let hidden = inst.without_label();
        assert!(!hidden.is_labelled());
        assert_eq!(hidden.class_index(), None);
        assert_eq!(hidden.features, inst.features);

        let relabelled = hidden.relabelled(0.0);
        assert_eq!(relabelled.class_index(), Some(0));
        assert_eq!(Instance::new(vec![], -1.0).class_index(), None);
    }
}
