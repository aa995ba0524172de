//! Experiment Configuration
//!
//! Serde representation of detectors, learners, streams and evaluation
//! settings. Each configuration resolves into the runtime object with
//! `build`, which is where invalid parameters are reported.
use crate::constants::{
    DDM_MIN_INSTANCES, DDM_OUT_CONTROL_LEVEL, DDM_WARNING_LEVEL, DEFAULT_AGREEMENT_PERCENTAGE, DEFAULT_BATCH_WIDTH,
    DEFAULT_INSTANCE_LIMIT, DEFAULT_P_VALUE_THRESHOLD, DEFAULT_RESET_INSTANCES, DEFAULT_SAMPLE_FREQUENCY,
    DEFAULT_WINDOW_SIZE,
};
use crate::drift::{
    ChangeDetector, DdmDetector, DetectorEnsemble, HypothesisTestDetector, PeriodicDetector, StatisticalTest,
    WarningAggregation,
};
use crate::errors::DriftError;
use crate::evaluation::{
    ConceptDriftEvaluator, DriftPositionMode, EvaluationHarness, LabelingMode, LearningCurve,
};
use crate::learner::{
    DriftAdaptiveClassifier, Learner, MajorityClass, MultivariateDetectorLearner, NaiveBayes, StuddLearner,
    StuddMode, UnivariateDetectorLearner,
};
use crate::stream::SyntheticDriftStream;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

fn default_test() -> StatisticalTest {
    StatisticalTest::Ks
}
fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}
fn default_threshold() -> f64 {
    DEFAULT_P_VALUE_THRESHOLD
}
fn default_min_instances() -> usize {
    DDM_MIN_INSTANCES
}
fn default_warning_level() -> f64 {
    DDM_WARNING_LEVEL
}
fn default_out_control_level() -> f64 {
    DDM_OUT_CONTROL_LEVEL
}
fn default_reset_instances() -> usize {
    DEFAULT_RESET_INSTANCES
}
fn default_agreement_percentage() -> u32 {
    DEFAULT_AGREEMENT_PERCENTAGE
}
fn default_batch_width() -> usize {
    DEFAULT_BATCH_WIDTH
}
fn default_instance_limit() -> Option<u64> {
    Some(DEFAULT_INSTANCE_LIMIT)
}
fn default_sample_frequency() -> u64 {
    DEFAULT_SAMPLE_FREQUENCY
}
fn default_seed() -> u64 {
    1
}
fn default_learner() -> Box<LearnerConfig> {
    Box::new(LearnerConfig::NaiveBayes)
}

/// Test names are resolved through `FromStr`, so aliases are accepted and
/// unknown names list the valid choices.
fn parse_test<'de, D>(d: D) -> Result<StatisticalTest, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(d)?;
    name.parse().map_err(de::Error::custom)
}

/// Negative values and null mean "no limit".
pub(crate) fn parse_limit<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(d).map(|x: Option<i64>| x.and_then(|v| u64::try_from(v).ok()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectorConfig {
    HypothesisTest {
        #[serde(default = "default_test", deserialize_with = "parse_test")]
        test: StatisticalTest,
        #[serde(default = "default_window_size")]
        window_size: usize,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Ddm {
        #[serde(default = "default_min_instances")]
        min_instances: usize,
        #[serde(default = "default_warning_level")]
        warning_level: f64,
        #[serde(default = "default_out_control_level")]
        out_control_level: f64,
    },
    Periodic {
        #[serde(default = "default_reset_instances")]
        reset_instances: usize,
    },
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Ddm {
            min_instances: DDM_MIN_INSTANCES,
            warning_level: DDM_WARNING_LEVEL,
            out_control_level: DDM_OUT_CONTROL_LEVEL,
        }
    }
}

impl DetectorConfig {
    pub fn build(&self) -> Result<Box<dyn ChangeDetector>, DriftError> {
        let detector: Box<dyn ChangeDetector> = match self {
            DetectorConfig::HypothesisTest {
                test,
                window_size,
                threshold,
            } => Box::new(HypothesisTestDetector::new(*test, *window_size, *threshold)?),
            DetectorConfig::Ddm {
                min_instances,
                warning_level,
                out_control_level,
            } => Box::new(DdmDetector::new(*min_instances, *warning_level, *out_control_level)?),
            DetectorConfig::Periodic { reset_instances } => Box::new(PeriodicDetector::new(*reset_instances)?),
        };
        Ok(detector)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearnerConfig {
    MajorityClass,
    NaiveBayes,
    DriftAdaptive {
        #[serde(default = "default_learner")]
        base_learner: Box<LearnerConfig>,
        #[serde(default)]
        detector: DetectorConfig,
    },
    Studd {
        #[serde(default = "default_learner")]
        teacher: Box<LearnerConfig>,
        #[serde(default = "default_learner")]
        student: Box<LearnerConfig>,
        #[serde(default)]
        detector: DetectorConfig,
        #[serde(default = "default_batch_width")]
        batch_width: usize,
        #[serde(default)]
        mode: StuddMode,
    },
    UnivariateDetector {
        #[serde(default)]
        detector: DetectorConfig,
    },
    MultivariateDetector {
        #[serde(default)]
        detector: DetectorConfig,
        #[serde(default = "default_agreement_percentage")]
        agreement_percentage: u32,
        #[serde(default)]
        warning_aggregation: WarningAggregation,
        #[serde(default)]
        parallel: bool,
    },
}

impl LearnerConfig {
    pub fn build(&self) -> Result<Box<dyn Learner>, DriftError> {
        let learner: Box<dyn Learner> = match self {
            LearnerConfig::MajorityClass => Box::new(MajorityClass::new()),
            LearnerConfig::NaiveBayes => Box::new(NaiveBayes::new()),
            LearnerConfig::DriftAdaptive { base_learner, detector } => {
                Box::new(DriftAdaptiveClassifier::new(base_learner.build()?, detector.build()?))
            }
            LearnerConfig::Studd {
                teacher,
                student,
                detector,
                batch_width,
                mode,
            } => Box::new(
                StuddLearner::new(teacher.build()?, student.build()?, detector.build()?, *batch_width)?.set_mode(*mode),
            ),
            LearnerConfig::UnivariateDetector { detector } => Box::new(UnivariateDetectorLearner::new(detector.build()?)),
            LearnerConfig::MultivariateDetector {
                detector,
                agreement_percentage,
                warning_aggregation,
                parallel,
            } => {
                let ensemble = DetectorEnsemble::new(detector.build()?, *agreement_percentage)?
                    .set_warning_aggregation(*warning_aggregation)
                    .set_parallel(*parallel);
                Box::new(MultivariateDetectorLearner::new(ensemble))
            }
        };
        Ok(learner)
    }
}

/// Synthetic drift stream settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub num_features: usize,
    #[serde(default)]
    pub drift_positions: Vec<u64>,
    /// Defaults to abrupt drifts when empty.
    #[serde(default)]
    pub drift_widths: Vec<u64>,
    #[serde(default)]
    pub noise: f64,
    #[serde(default)]
    pub feature_shift: f64,
    #[serde(default, deserialize_with = "parse_limit")]
    pub max_instances: Option<u64>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl StreamConfig {
    pub fn build(&self) -> Result<SyntheticDriftStream, DriftError> {
        let widths = if self.drift_widths.is_empty() {
            vec![0; self.drift_positions.len()]
        } else {
            self.drift_widths.clone()
        };
        Ok(
            SyntheticDriftStream::new(self.num_features, self.drift_positions.clone(), widths, self.seed)?
                .set_noise(self.noise)?
                .set_feature_shift(self.feature_shift)
                .set_max_instances(self.max_instances),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub labeling: LabelingMode,
    #[serde(default = "default_instance_limit", deserialize_with = "parse_limit")]
    pub instance_limit: Option<u64>,
    #[serde(default, deserialize_with = "parse_limit")]
    pub time_limit_seconds: Option<u64>,
    #[serde(default = "default_sample_frequency")]
    pub sample_frequency: u64,
    #[serde(default)]
    pub drift_position_mode: DriftPositionMode,
    #[serde(default)]
    pub train_on_unlabelled: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            labeling: LabelingMode::default(),
            instance_limit: default_instance_limit(),
            time_limit_seconds: None,
            sample_frequency: DEFAULT_SAMPLE_FREQUENCY,
            drift_position_mode: DriftPositionMode::default(),
            train_on_unlabelled: false,
            seed: default_seed(),
        }
    }
}

impl EvaluationConfig {
    pub fn build(&self) -> EvaluationHarness {
        EvaluationHarness::new(self.labeling)
            .set_instance_limit(self.instance_limit)
            .set_time_limit(self.time_limit_seconds.map(Duration::from_secs))
            .set_sample_frequency(self.sample_frequency)
            .set_drift_position_mode(self.drift_position_mode)
            .set_train_on_unlabelled(self.train_on_unlabelled)
            .set_seed(self.seed)
    }
}

/// A complete experiment: learner, stream and evaluation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub learner: LearnerConfig,
    pub stream: StreamConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl ExperimentConfig {
    pub fn from_json(json_str: &str) -> Result<Self, DriftError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| DriftError::UnableToRead(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriftError> {
        let json_str = fs::read_to_string(path).map_err(|e| DriftError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }

    pub fn json_dump(&self) -> Result<String, DriftError> {
        serde_json::to_string(self).map_err(|e| DriftError::UnableToWrite(e.to_string()))
    }

    /// Build every component and run the evaluation.
    pub fn run(&self) -> Result<(LearningCurve, ConceptDriftEvaluator), DriftError> {
        let mut learner = self.learner.build()?;
        let mut stream = self.stream.build()?;
        let mut evaluator = ConceptDriftEvaluator::new();
        let curve = self
            .evaluation
            .build()
            .run(learner.as_mut(), &mut stream, &mut evaluator)?;
        Ok((curve, evaluator))
    }
}
