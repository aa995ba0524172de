use crate::data::{Instance, Schema};
use crate::drift::{DdmDetector, DetectorEnsemble, DetectorOutput, HypothesisTestDetector, StatisticalTest};
use crate::errors::DriftError;
use crate::evaluation::harness::{INSTANCES_MEASUREMENT, RAM_HOURS_MEASUREMENT};
use crate::evaluation::{ConceptDriftEvaluator, DriftPositionMode, EvaluationHarness, LabelingMode, PerformanceEvaluator};
use crate::learner::{DriftAdaptiveClassifier, Learner, MultivariateDetectorLearner, NaiveBayes};
use crate::metric::Measurement;
use crate::stream::{MemoryStream, SyntheticDriftStream};

/// Votes a change after its `n`-th training call for every `n` in `fire_at`.
#[derive(Clone)]
struct FireAtLearner {
    fire_at: Vec<u64>,
    seen: u64,
}

impl Learner for FireAtLearner {
    fn reset(&mut self) {
        self.seen = 0;
    }
    fn train(&mut self, _instance: &Instance) -> Result<(), DriftError> {
        self.seen += 1;
        Ok(())
    }
    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        DetectorOutput {
            is_change: self.fire_at.contains(&self.seen),
            ..Default::default()
        }
        .to_votes()
        .to_vec()
    }
    fn byte_size(&self) -> usize {
        1024
    }
    fn training_weight_seen(&self) -> f64 {
        self.seen as f64
    }
    fn model_measurements(&mut self) -> Vec<Measurement> {
        vec![Measurement::new("fired", self.fire_at.len() as f64)]
    }
    fn description(&self) -> String {
        "FireAtLearner".to_string()
    }
    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

/// Counts labelled and unlabelled training calls, and refuses to see labels at prediction time.
#[derive(Clone, Default)]
struct CountingLearner {
    labelled: u64,
    unlabelled: u64,
    fail_at: Option<u64>,
    blind_predictions: bool,
}

impl Learner for CountingLearner {
    fn reset(&mut self) {
        self.labelled = 0;
        self.unlabelled = 0;
    }
    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        if instance.is_labelled() {
            self.labelled += 1;
        } else {
            self.unlabelled += 1;
        }
        if Some(self.labelled + self.unlabelled) == self.fail_at {
            return Err(DriftError::DegenerateStatistics("scripted failure".to_string()));
        }
        Ok(())
    }
    fn predict(&self, instance: &Instance) -> Vec<f64> {
        if self.blind_predictions {
            assert!(!instance.is_labelled());
        }
        vec![0.0; 4]
    }
    fn byte_size(&self) -> usize {
        0
    }
    fn training_weight_seen(&self) -> f64 {
        self.labelled as f64
    }
    fn description(&self) -> String {
        "CountingLearner".to_string()
    }
    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

fn constant_stream(n: usize, drifts: Vec<u64>) -> MemoryStream {
    let instances = (0..n).map(|i| Instance::new(vec![i as f64], (i % 2) as f64)).collect();
    let widths = vec![0; drifts.len()];
    MemoryStream::new(Schema::new(1, 2), instances)
        .with_drifts(drifts, widths)
        .unwrap()
}

fn measurement(evaluator: &ConceptDriftEvaluator, name: &str) -> f64 {
    evaluator
        .performance_measurements()
        .into_iter()
        .find(|m| m.name == name)
        .map(|m| m.value)
        .unwrap_or(f64::NAN)
}

fn delayed(delay_length: usize, initial_window: usize, train_on_initial_window: bool, train_in_batches: bool) -> LabelingMode {
    LabelingMode::Delayed {
        delay_length,
        initial_window,
        train_on_initial_window,
        train_in_batches,
    }
}

#[test]
fn test_detection_delay_end_to_end() {
    let mut learner = FireAtLearner {
        fire_at: vec![510],
        seen: 0,
    };
    let mut stream = constant_stream(600, vec![500]);
    let mut evaluator = ConceptDriftEvaluator::new();
    let curve = EvaluationHarness::default()
        .set_sample_frequency(100)
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();

    assert_eq!(evaluator.total_delay(), 10.0);
    assert_eq!(evaluator.number_detections_occurred(), 1.0);
    assert_eq!(measurement(&evaluator, "delay detection (average)"), 10.0);

    assert_eq!(curve.len(), 6);
    assert_eq!(
        curve.column(INSTANCES_MEASUREMENT),
        vec![Some(100.0), Some(200.0), Some(300.0), Some(400.0), Some(500.0), Some(600.0)]
    );
    let last = curve.last().unwrap();
    assert_eq!(last.value("true changes detected"), Some(1.0));
    assert_eq!(last.value("fired"), Some(1.0));
    assert!(last.value(RAM_HOURS_MEASUREMENT).unwrap() >= 0.0);
}

#[test]
fn test_cumulative_drift_positions() {
    let mut learner = FireAtLearner {
        fire_at: vec![105, 170],
        seen: 0,
    };
    let mut stream = constant_stream(200, vec![100, 50]);
    let mut evaluator = ConceptDriftEvaluator::new();
    EvaluationHarness::default()
        .set_drift_position_mode(DriftPositionMode::Cumulative)
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();
    assert_eq!(evaluator.number_changes(), 2.0);
    assert_eq!(evaluator.total_delay(), 25.0);
}

#[test]
fn test_single_final_snapshot_and_instance_limit() {
    let mut learner = FireAtLearner {
        fire_at: vec![],
        seen: 0,
    };
    let mut stream = constant_stream(100, vec![]);
    let mut evaluator = ConceptDriftEvaluator::new();
    let curve = EvaluationHarness::default()
        .set_sample_frequency(0)
        .set_instance_limit(Some(42))
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();
    assert_eq!(curve.len(), 1);
    assert_eq!(curve.entries[0].value(INSTANCES_MEASUREMENT), Some(42.0));
    assert_eq!(learner.seen, 42);
}

#[test]
fn test_partial_labelling_is_seeded() {
    let run = |seed: u64, train_on_unlabelled: bool| {
        let mut learner = CountingLearner::default();
        let mut stream = constant_stream(1000, vec![]);
        let mut evaluator = ConceptDriftEvaluator::new();
        EvaluationHarness::new(LabelingMode::Partial {
            percentage_unlabelled: 40,
        })
        .set_seed(seed)
        .set_train_on_unlabelled(train_on_unlabelled)
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();
        (learner.labelled, learner.unlabelled)
    };

    let (labelled, unlabelled) = run(3, false);
    assert_eq!(unlabelled, 0);
    assert!(labelled > 520 && labelled < 680);
    assert_eq!(run(3, false), (labelled, 0));
    assert_eq!(run(3, true), (labelled, 1000 - labelled));
}

#[test]
fn test_delayed_training() {
    let run = |labeling: LabelingMode| {
        let mut learner = CountingLearner {
            blind_predictions: true,
            ..Default::default()
        };
        let mut stream = constant_stream(100, vec![]);
        let mut evaluator = ConceptDriftEvaluator::new();
        EvaluationHarness::new(labeling)
            .set_instance_limit(Some(45))
            .run(&mut learner, &mut stream, &mut evaluator)
            .unwrap();
        (learner.labelled, evaluator.total_weight_observed())
    };

    // Instances 11..=20 of the initial window are queued, then one is released per instance.
    assert_eq!(run(delayed(10, 20, false, false)), (25, 25.0));
    assert_eq!(run(delayed(10, 20, false, true)), (30, 25.0));
    assert_eq!(run(delayed(10, 20, true, false)), (35, 25.0));
}

#[test]
fn test_failure_is_wrapped() {
    let mut learner = CountingLearner {
        fail_at: Some(7),
        ..Default::default()
    };
    let mut stream = constant_stream(20, vec![]);
    let mut evaluator = ConceptDriftEvaluator::new();
    let err = EvaluationHarness::default()
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap_err();
    match err {
        DriftError::EvaluationFailed {
            instance,
            learner,
            source,
        } => {
            assert_eq!(instance, 7);
            assert_eq!(learner, "CountingLearner");
            assert!(matches!(*source, DriftError::DegenerateStatistics(_)));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_invalid_percentage_rejected() {
    let mut learner = CountingLearner::default();
    let mut stream = constant_stream(5, vec![]);
    let mut evaluator = ConceptDriftEvaluator::new();
    let res = EvaluationHarness::new(LabelingMode::Partial {
        percentage_unlabelled: 120,
    })
    .run(&mut learner, &mut stream, &mut evaluator);
    assert!(matches!(res, Err(DriftError::InvalidParameter(..))));
    assert_eq!(learner.labelled, 0);
}

#[test]
fn test_ensemble_detects_feature_drift() {
    let prototype = HypothesisTestDetector::new(StatisticalTest::Ks, 50, 0.01).unwrap();
    let ensemble = DetectorEnsemble::new(Box::new(prototype), 60).unwrap();
    let mut learner = MultivariateDetectorLearner::new(ensemble);
    let mut stream = SyntheticDriftStream::new(5, vec![1000], vec![0], 11)
        .unwrap()
        .set_feature_shift(2.0)
        .set_max_instances(Some(2000));
    let mut evaluator = ConceptDriftEvaluator::new();
    EvaluationHarness::default()
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();
    assert_eq!(evaluator.number_changes(), 1.0);
    assert_eq!(evaluator.number_detections_occurred(), 1.0);
    assert!(evaluator.total_delay() < 150.0);
}

#[test]
fn test_adaptive_classifier_detects_label_drift() {
    let mut learner = DriftAdaptiveClassifier::new(Box::new(NaiveBayes::new()), Box::new(DdmDetector::default()));
    let mut stream = SyntheticDriftStream::new(2, vec![1000], vec![0], 5)
        .unwrap()
        .set_max_instances(Some(2000));
    let mut evaluator = ConceptDriftEvaluator::new();
    let curve = EvaluationHarness::default()
        .set_sample_frequency(500)
        .run(&mut learner, &mut stream, &mut evaluator)
        .unwrap();
    assert_eq!(evaluator.number_detections_occurred(), 1.0);
    assert!(evaluator.total_delay() < 200.0);
    let changes: f64 = curve.column("change detected").into_iter().flatten().sum();
    assert!(changes >= 1.0);
}
