//! Evaluation Harness
//!
//! Drives a learner over a drift stream, feeds its votes to an evaluator
//! together with the drift ground truth and records a learning curve.
//!
//! Two labelling regimes are supported. In the partially labelled regime a
//! seeded sampler decides which instances are used for training before the
//! learner is queried. In the delayed regime labels arrive `delay_length`
//! instances late, so training always lags prediction.
use crate::constants::{
    BYTES_PER_GIGABYTE, DEFAULT_DELAY_LENGTH, DEFAULT_INITIAL_WINDOW, DEFAULT_INSTANCE_LIMIT,
    DEFAULT_SAMPLE_FREQUENCY, SECONDS_PER_HOUR,
};
use crate::data::Instance;
use crate::errors::DriftError;
use crate::evaluation::{LearningCurve, LearningEvaluation, PerformanceEvaluator};
use crate::learner::Learner;
use crate::metric::Measurement;
use crate::sampler::{LabelSampler, RandomLabelSampler};
use crate::stream::ConceptDriftStream;
use crate::utils::items_to_strings;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

pub const INSTANCES_MEASUREMENT: &str = "learning evaluation instances";
pub const TIME_MEASUREMENT: &str = "evaluation time (seconds)";
pub const RAM_HOURS_MEASUREMENT: &str = "model cost (RAM-Hours)";

fn default_delay_length() -> usize {
    DEFAULT_DELAY_LENGTH
}

fn default_initial_window() -> usize {
    DEFAULT_INITIAL_WINDOW
}

/// How labels become available to the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LabelingMode {
    /// Each instance keeps its label with probability `1 - percentage_unlabelled / 100`.
    Partial {
        #[serde(default)]
        percentage_unlabelled: u32,
    },
    /// Labels arrive `delay_length` instances after the instance itself.
    Delayed {
        #[serde(default = "default_delay_length")]
        delay_length: usize,
        /// Instances used only for training before evaluation starts.
        #[serde(default = "default_initial_window")]
        initial_window: usize,
        /// Train on the initial window without delay.
        #[serde(default)]
        train_on_initial_window: bool,
        /// Release all pending labels at once instead of one per instance.
        #[serde(default)]
        train_in_batches: bool,
    },
}

impl Default for LabelingMode {
    fn default() -> Self {
        LabelingMode::Partial {
            percentage_unlabelled: 0,
        }
    }
}

/// Interpretation of the drift positions published by a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriftPositionMode {
    /// Positions are 1-based instance counts.
    #[default]
    Absolute,
    /// Positions are gaps between consecutive drifts.
    Cumulative,
}

impl FromStr for DriftPositionMode {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Absolute" => Ok(DriftPositionMode::Absolute),
            "Cumulative" => Ok(DriftPositionMode::Cumulative),
            _ => Err(DriftError::ParseString(
                s.to_string(),
                "DriftPositionMode".to_string(),
                items_to_strings(vec!["Absolute", "Cumulative"]),
            )),
        }
    }
}

/// 1 when a drift happens exactly at the `processed`-th instance, else 0.
pub fn find_ground_truth(drift_positions: &[u64], mode: DriftPositionMode, processed: u64) -> u8 {
    let hit = match mode {
        DriftPositionMode::Absolute => drift_positions.contains(&processed),
        DriftPositionMode::Cumulative => drift_positions
            .iter()
            .scan(0u64, |sum, gap| {
                *sum += gap;
                Some(*sum)
            })
            .any(|position| position == processed),
    };
    u8::from(hit)
}

/// Wall clock and memory cost bookkeeping between snapshots.
struct CostClock {
    start: Instant,
    last: Instant,
    ram_hours: f64,
}

impl CostClock {
    fn start() -> Self {
        let now = Instant::now();
        CostClock {
            start: now,
            last: now,
            ram_hours: 0.0,
        }
    }

    /// Returns seconds since start and the cumulative RAM-hours.
    fn tick(&mut self, byte_size: usize) -> (f64, f64) {
        let now = Instant::now();
        let increment = now.duration_since(self.last).as_secs_f64();
        self.ram_hours += byte_size as f64 / BYTES_PER_GIGABYTE * (increment / SECONDS_PER_HOUR);
        self.last = now;
        (now.duration_since(self.start).as_secs_f64(), self.ram_hours)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationHarness {
    pub labeling: LabelingMode,
    /// Maximum number of instances to process, `None` for no limit.
    pub instance_limit: Option<u64>,
    /// Maximum wall clock time, checked between instances.
    pub time_limit: Option<Duration>,
    /// Snapshot period in instances, 0 for a single final snapshot.
    pub sample_frequency: u64,
    pub drift_position_mode: DriftPositionMode,
    /// Pass instances whose label is withheld to the learner without label.
    pub train_on_unlabelled: bool,
    pub seed: u64,
}

impl Default for EvaluationHarness {
    fn default() -> Self {
        EvaluationHarness {
            labeling: LabelingMode::default(),
            instance_limit: Some(DEFAULT_INSTANCE_LIMIT),
            time_limit: None,
            sample_frequency: DEFAULT_SAMPLE_FREQUENCY,
            drift_position_mode: DriftPositionMode::default(),
            train_on_unlabelled: false,
            seed: 1,
        }
    }
}

impl EvaluationHarness {
    pub fn new(labeling: LabelingMode) -> Self {
        EvaluationHarness {
            labeling,
            ..Default::default()
        }
    }

    pub fn set_labeling(mut self, labeling: LabelingMode) -> Self {
        self.labeling = labeling;
        self
    }

    pub fn set_instance_limit(mut self, instance_limit: Option<u64>) -> Self {
        self.instance_limit = instance_limit;
        self
    }

    pub fn set_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn set_sample_frequency(mut self, sample_frequency: u64) -> Self {
        self.sample_frequency = sample_frequency;
        self
    }

    pub fn set_drift_position_mode(mut self, drift_position_mode: DriftPositionMode) -> Self {
        self.drift_position_mode = drift_position_mode;
        self
    }

    pub fn set_train_on_unlabelled(mut self, train_on_unlabelled: bool) -> Self {
        self.train_on_unlabelled = train_on_unlabelled;
        self
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn within_limits(&self, processed: u64, clock: &CostClock) -> bool {
        if self.instance_limit.is_some_and(|limit| processed >= limit) {
            return false;
        }
        if let Some(limit) = self.time_limit {
            if clock.start.elapsed() >= limit {
                warn!("Time limit of {:?} reached after {} instances", limit, processed);
                return false;
            }
        }
        true
    }

    fn snapshot(
        &self,
        clock: &mut CostClock,
        processed: u64,
        learner: &mut dyn Learner,
        evaluator: &dyn PerformanceEvaluator,
    ) -> LearningEvaluation {
        let (seconds, ram_hours) = clock.tick(learner.byte_size());
        let mut measurements = vec![
            Measurement::new(INSTANCES_MEASUREMENT, processed as f64),
            Measurement::new(TIME_MEASUREMENT, seconds),
            Measurement::new(RAM_HOURS_MEASUREMENT, ram_hours),
        ];
        measurements.extend(evaluator.performance_measurements());
        measurements.extend(learner.model_measurements());
        debug!("Snapshot taken after {} instances", processed);
        LearningEvaluation::new(measurements)
    }

    /// Train on the instance when the sampler reveals its label, then predict.
    fn partial_step(
        &self,
        learner: &mut dyn Learner,
        sampler: &mut RandomLabelSampler,
        rng: &mut StdRng,
        instance: &Instance,
    ) -> Result<Vec<f64>, DriftError> {
        if sampler.is_labelled(rng) {
            learner.train(instance)?;
        } else if self.train_on_unlabelled {
            learner.train(&instance.without_label())?;
        }
        Ok(learner.predict(instance))
    }

    /// Queue the instance for delayed training. Returns the votes, or `None`
    /// while the initial window is still being consumed.
    fn delayed_step(
        &self,
        learner: &mut dyn Learner,
        pending: &mut VecDeque<Instance>,
        processed: u64,
        instance: &Instance,
    ) -> Result<Option<Vec<f64>>, DriftError> {
        let LabelingMode::Delayed {
            delay_length,
            initial_window,
            train_on_initial_window,
            train_in_batches,
        } = self.labeling
        else {
            return Ok(None);
        };

        if processed <= initial_window as u64 {
            if train_on_initial_window {
                learner.train(instance)?;
            } else if initial_window as u64 - processed < delay_length as u64 {
                pending.push_back(instance.clone());
            }
            return Ok(None);
        }

        pending.push_back(instance.clone());
        if pending.len() > delay_length {
            if train_in_batches {
                // Keep the newest instance so a batch never exceeds the delay.
                while pending.len() > 1 {
                    if let Some(ready) = pending.pop_front() {
                        learner.train(&ready)?;
                    }
                }
            } else if let Some(ready) = pending.pop_front() {
                learner.train(&ready)?;
            }
        }
        Ok(Some(learner.predict(&instance.without_label())))
    }

    /// Evaluate `learner` on `stream`.
    ///
    /// A failure of the learner stops the run and is reported together with the
    /// 1-based index of the instance being processed.
    pub fn run(
        &self,
        learner: &mut dyn Learner,
        stream: &mut dyn ConceptDriftStream,
        evaluator: &mut dyn PerformanceEvaluator,
    ) -> Result<LearningCurve, DriftError> {
        let drift_positions = stream.drift_positions().to_vec();
        let percentage_unlabelled = match self.labeling {
            LabelingMode::Partial { percentage_unlabelled } => percentage_unlabelled,
            LabelingMode::Delayed { .. } => 0,
        };
        let mut sampler = RandomLabelSampler::new(percentage_unlabelled)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut pending: VecDeque<Instance> = VecDeque::new();
        let mut curve = LearningCurve::new(INSTANCES_MEASUREMENT);
        let mut clock = CostClock::start();
        let mut processed = 0u64;
        let mut last_evaluated = 0u64;
        let mut last_snapshot = 0u64;

        info!(
            "Evaluating {} on a stream with {} drifts",
            learner.description(),
            drift_positions.len()
        );

        while stream.has_more_instances() && self.within_limits(processed, &clock) {
            let instance = match stream.next_instance() {
                Some(instance) => instance,
                None => break,
            };
            processed += 1;
            let ground_truth = find_ground_truth(&drift_positions, self.drift_position_mode, processed);

            let step = match self.labeling {
                LabelingMode::Partial { .. } => self
                    .partial_step(learner, &mut sampler, &mut rng, &instance)
                    .map(Some),
                LabelingMode::Delayed { .. } => self.delayed_step(learner, &mut pending, processed, &instance),
            };
            let votes = match step {
                Ok(Some(votes)) => votes,
                Ok(None) => continue,
                Err(e) => {
                    return Err(DriftError::EvaluationFailed {
                        instance: processed,
                        learner: learner.description(),
                        source: Box::new(e),
                    })
                }
            };

            evaluator.add_result(&instance, ground_truth, &votes);
            last_evaluated = processed;

            let periodic = self.sample_frequency > 0 && processed % self.sample_frequency == 0;
            if periodic || !stream.has_more_instances() {
                curve.insert_entry(self.snapshot(&mut clock, processed, learner, evaluator));
                last_snapshot = processed;
            }
        }

        if last_evaluated > last_snapshot {
            curve.insert_entry(self.snapshot(&mut clock, last_evaluated, learner, evaluator));
        }
        info!(
            "Evaluation finished after {} instances with {} snapshots",
            processed,
            curve.len()
        );
        Ok(curve)
    }
}
