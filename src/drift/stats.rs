//! Two-sample statistical tests
//!
//! Each test compares a reference sample against a test sample and returns a
//! two-sided p-value for the null hypothesis that both were drawn from the
//! same distribution.
use crate::errors::DriftError;
use crate::utils::{items_to_strings, mean, sample_variance};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub type TestFn = fn(&[f64], &[f64]) -> Result<f64, DriftError>;

/// Hypothesis test backing a [`HypothesisTestDetector`](crate::drift::HypothesisTestDetector).
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum StatisticalTest {
    /// Two-sample Kolmogorov-Smirnov test.
    #[serde(rename = "ks")]
    Ks,
    /// Wilcoxon rank-sum (Mann-Whitney U) test.
    #[serde(rename = "wilcoxon")]
    WilcoxonRankSum,
    /// Two-sample Welch t-test.
    #[serde(rename = "ttest")]
    TTest,
}

impl StatisticalTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticalTest::Ks => "ks",
            StatisticalTest::WilcoxonRankSum => "wilcoxon",
            StatisticalTest::TTest => "ttest",
        }
    }

    /// Compute the p-value of this test for the two samples.
    pub fn p_value(&self, reference: &[f64], test: &[f64]) -> Result<f64, DriftError> {
        test_callable(self)(reference, test)
    }
}

impl fmt::Display for StatisticalTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticalTest {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ks" => Ok(StatisticalTest::Ks),
            "wilcoxon" | "wrs" => Ok(StatisticalTest::WilcoxonRankSum),
            "ttest" | "tt" => Ok(StatisticalTest::TTest),
            _ => Err(DriftError::ParseString(
                s.to_string(),
                "StatisticalTest".to_string(),
                items_to_strings(vec!["ks", "wilcoxon", "ttest"]),
            )),
        }
    }
}

pub fn test_callable(test: &StatisticalTest) -> TestFn {
    match test {
        StatisticalTest::Ks => kolmogorov_smirnov_test,
        StatisticalTest::WilcoxonRankSum => wilcoxon_rank_sum_test,
        StatisticalTest::TTest => t_test,
    }
}

fn check_samples(a: &[f64], b: &[f64], min_len: usize, name: &str) -> Result<(), DriftError> {
    if a.len() < min_len || b.len() < min_len {
        return Err(DriftError::DegenerateStatistics(format!(
            "{} needs at least {} values per sample, got {} and {}",
            name,
            min_len,
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b.iter()).any(|v| v.is_nan()) {
        return Err(DriftError::DegenerateStatistics(format!("{} received a NaN value", name)));
    }
    Ok(())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

fn standard_normal() -> Result<Normal, DriftError> {
    Normal::new(0.0, 1.0).map_err(|e| DriftError::DegenerateStatistics(e.to_string()))
}

/// Largest distance between the empirical CDFs of both samples.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    let a = sorted(a);
    let b = sorted(b);
    let (n, m) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n - j as f64 / m).abs());
    }
    d
}

/// Kolmogorov distribution tail probability Q(lambda).
fn kolmogorov_tail(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut term_prev: f64 = 0.0;
    for j in 1..=100 {
        let jf = j as f64;
        let term = fac * (a2 * jf * jf).exp();
        sum += term;
        if term.abs() <= 1e-3 * term_prev || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        term_prev = term.abs();
    }
    // Series did not converge, which only happens for tiny lambda.
    1.0
}

/// Two-sample Kolmogorov-Smirnov test using the asymptotic distribution
/// with Stephens' small sample correction.
pub fn kolmogorov_smirnov_test(a: &[f64], b: &[f64]) -> Result<f64, DriftError> {
    check_samples(a, b, 1, "Kolmogorov-Smirnov test")?;
    let d = ks_statistic(a, b);
    let (n, m) = (a.len() as f64, b.len() as f64);
    let en = (n * m / (n + m)).sqrt();
    Ok(kolmogorov_tail((en + 0.12 + 0.11 / en) * d))
}

/// Average ranks of the pooled samples, plus the tie correction term sum(t^3 - t).
fn pooled_ranks(a: &[f64], b: &[f64]) -> (Vec<f64>, f64) {
    let mut pooled: Vec<(f64, usize)> = a
        .iter()
        .map(|v| (*v, 0))
        .chain(b.iter().map(|v| (*v, 1)))
        .collect();
    pooled.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal));

    let mut ranks_a = Vec::with_capacity(a.len());
    let mut ties = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start + 1;
        while end < pooled.len() && pooled[end].0 == pooled[start].0 {
            end += 1;
        }
        let t = (end - start) as f64;
        ties += t * t * t - t;
        // ranks are 1 based
        let rank = (start + end + 1) as f64 / 2.0;
        for item in &pooled[start..end] {
            if item.1 == 0 {
                ranks_a.push(rank);
            }
        }
        start = end;
    }
    (ranks_a, ties)
}

/// Wilcoxon rank-sum test with the tie-corrected normal approximation.
pub fn wilcoxon_rank_sum_test(a: &[f64], b: &[f64]) -> Result<f64, DriftError> {
    check_samples(a, b, 1, "Wilcoxon rank-sum test")?;
    let (n, m) = (a.len() as f64, b.len() as f64);
    let total = n + m;
    let (ranks_a, ties) = pooled_ranks(a, b);
    let u = ranks_a.iter().sum::<f64>() - n * (n + 1.0) / 2.0;
    let mean_u = n * m / 2.0;
    let var_u = n * m / 12.0 * ((total + 1.0) - ties / (total * (total - 1.0)));
    if var_u <= 0.0 || !var_u.is_finite() {
        return Err(DriftError::DegenerateStatistics(
            "Wilcoxon rank-sum test found every value tied".to_string(),
        ));
    }
    let z = (u - mean_u) / var_u.sqrt();
    let normal = standard_normal()?;
    Ok((2.0 * normal.cdf(-z.abs())).min(1.0))
}

/// Two-sided Welch t-test for samples with possibly unequal variances.
pub fn t_test(a: &[f64], b: &[f64]) -> Result<f64, DriftError> {
    check_samples(a, b, 2, "t-test")?;
    let (n, m) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (sample_variance(a) / n, sample_variance(b) / m);
    let se2 = va + vb;
    let diff = mean(a) - mean(b);
    if se2 <= 0.0 {
        if diff == 0.0 {
            return Err(DriftError::DegenerateStatistics(
                "t-test found zero variance and equal means in both samples".to_string(),
            ));
        }
        return Ok(0.0);
    }
    let t = diff / se2.sqrt();
    let df = se2 * se2 / (va * va / (n - 1.0) + vb * vb / (m - 1.0));
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| DriftError::DegenerateStatistics(e.to_string()))?;
    Ok((2.0 * dist.cdf(-t.abs())).min(1.0))
}
