use crate::errors::DriftError;
use std::cmp::Ordering;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

// Validation
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), DriftError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(DriftError::InvalidParameter(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_positive_usize_parameter(value: usize, parameter: &str) -> Result<(), DriftError> {
    if value == 0 {
        Err(DriftError::InvalidParameter(
            parameter.to_string(),
            "integer value of at least 1".to_string(),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

pub fn validate_usize_parameter(value: usize, min: usize, max: usize, parameter: &str) -> Result<(), DriftError> {
    if value < min || max < value {
        Err(DriftError::InvalidParameter(
            parameter.to_string(),
            format!("integer value within range {} and {}", min, max),
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Index of the largest vote. Ties resolve to the lowest index,
/// NaN votes are never selected over a number.
pub fn max_index(votes: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in votes.iter().enumerate().skip(1) {
        if !v.is_nan() && (votes[best].is_nan() || v.partial_cmp(&votes[best]) == Some(Ordering::Greater)) {
            best = i;
        }
    }
    best
}

#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance.
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

pub fn precision_round(n: f64, precision: i32) -> f64 {
    let p = (10.0_f64).powi(precision);
    (n * p).round() / p
}
