//! Learning Curve
//!
//! Append-only sequence of evaluation snapshots, exportable as CSV or JSON.
use crate::errors::DriftError;
use crate::metric::{find_measurement, Measurement};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Measurements taken at one point of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEvaluation {
    pub measurements: Vec<Measurement>,
}

impl LearningEvaluation {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        LearningEvaluation { measurements }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        find_measurement(&self.measurements, name).map(|m| m.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    /// Name of the measurement that orders the entries.
    pub ordering_measurement: String,
    pub entries: Vec<LearningEvaluation>,
}

impl LearningCurve {
    pub fn new(ordering_measurement: &str) -> Self {
        LearningCurve {
            ordering_measurement: ordering_measurement.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn insert_entry(&mut self, entry: LearningEvaluation) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LearningEvaluation> {
        self.entries.last()
    }

    /// Every measurement name in order of first appearance.
    pub fn headers(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            for m in &entry.measurements {
                if !names.iter().any(|n| *n == m.name) {
                    names.push(m.name.clone());
                }
            }
        }
        names
    }

    /// Values of one measurement across all entries.
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.entries.iter().map(|e| e.value(name)).collect()
    }

    /// CSV with one row per entry. Measurements absent from an entry are left empty.
    pub fn to_csv_string(&self) -> Result<String, DriftError> {
        let headers = self.headers();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&headers)
            .map_err(|e| DriftError::UnableToWrite(e.to_string()))?;
        for entry in &self.entries {
            let row: Vec<String> = headers
                .iter()
                .map(|h| entry.value(h).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| DriftError::UnableToWrite(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| DriftError::UnableToWrite(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftError> {
        fs::write(path, self.to_csv_string()?).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DriftError> {
        serde_json::to_string(self).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    pub fn from_json(json_str: &str) -> Result<Self, DriftError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DriftError::UnableToRead(e.to_string()))
    }
}
