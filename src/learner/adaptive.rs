//! Drift Adaptive Classifier
//!
//! Keeps a serving model (champion) and a candidate (challenger). The
//! champion's mistakes feed a change detector:
//!
//! * in control, the challenger is armed for a reset;
//! * in the warning zone, an armed challenger is reset once, and then trained
//!   alongside the champion;
//! * out of control, the challenger replaces the champion and a fresh
//!   challenger is created from the base learner.
//!
//! The published votes are the detector's output, since the classifier is
//! evaluated on its drift behaviour rather than its accuracy.
use crate::data::Instance;
use crate::drift::ChangeDetector;
use crate::errors::DriftError;
use crate::learner::Learner;
use crate::metric::Measurement;
use crate::utils::max_index;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Control level derived from the detector after each instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftLevel {
    InControl,
    Warning,
    OutControl,
}

/// Changes and warnings seen since the last drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionCounters {
    pub changes: u64,
    pub warnings: u64,
}

impl DetectionCounters {
    /// Read the counters and start a new reporting period.
    pub fn drain(&mut self) -> DetectionCounters {
        std::mem::take(self)
    }
}

#[derive(Clone)]
pub struct DriftAdaptiveClassifier {
    base_learner: Box<dyn Learner>,
    detector_prototype: Box<dyn ChangeDetector>,
    champion: Box<dyn Learner>,
    challenger: Box<dyn Learner>,
    detector: Box<dyn ChangeDetector>,
    challenger_armed: bool,
    level: DriftLevel,
    counters: DetectionCounters,
}

impl DriftAdaptiveClassifier {
    /// Create a classifier using copies of `base_learner` as champion and challenger,
    /// and a copy of `detector` to monitor the champion.
    pub fn new(base_learner: Box<dyn Learner>, detector: Box<dyn ChangeDetector>) -> Self {
        let champion = base_learner.box_clone();
        let challenger = base_learner.box_clone();
        let monitor = detector.clone_box();
        let mut classifier = DriftAdaptiveClassifier {
            base_learner,
            detector_prototype: detector,
            champion,
            challenger,
            detector: monitor,
            challenger_armed: false,
            level: DriftLevel::InControl,
            counters: DetectionCounters::default(),
        };
        classifier.reset();
        classifier
    }

    pub fn champion(&self) -> &dyn Learner {
        self.champion.as_ref()
    }

    pub fn challenger(&self) -> &dyn Learner {
        self.challenger.as_ref()
    }

    pub fn detector(&self) -> &dyn ChangeDetector {
        self.detector.as_ref()
    }

    pub fn level(&self) -> DriftLevel {
        self.level
    }

    /// Counters of the current reporting period, without draining them.
    pub fn counters(&self) -> DetectionCounters {
        self.counters
    }

    pub fn challenger_armed(&self) -> bool {
        self.challenger_armed
    }

    /// Class votes of the serving model.
    pub fn champion_votes(&self, instance: &Instance) -> Vec<f64> {
        self.champion.predict(instance)
    }

    fn fresh_learner(&self) -> Box<dyn Learner> {
        let mut learner = self.base_learner.box_clone();
        learner.reset();
        learner
    }
}

impl Learner for DriftAdaptiveClassifier {
    fn reset(&mut self) {
        self.champion = self.fresh_learner();
        self.challenger = self.fresh_learner();
        self.detector = self.detector_prototype.clone_box();
        self.detector.reset();
        self.challenger_armed = false;
        self.level = DriftLevel::InControl;
        self.counters = DetectionCounters::default();
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        let true_class = match instance.class_index() {
            Some(c) => c,
            None => return Ok(()),
        };
        let correct = max_index(&self.champion_votes(instance)) == true_class;
        self.detector.input(if correct { 0.0 } else { 1.0 })?;

        self.level = if self.detector.change_detected() {
            DriftLevel::OutControl
        } else if self.detector.warning_zone() {
            DriftLevel::Warning
        } else {
            DriftLevel::InControl
        };

        match self.level {
            DriftLevel::InControl => {
                self.challenger_armed = true;
            }
            DriftLevel::Warning => {
                if self.challenger_armed {
                    debug!("Warning zone entered, restarting challenger");
                    self.counters.warnings += 1;
                    self.challenger.reset();
                    self.challenger_armed = false;
                }
                self.challenger.train(instance)?;
            }
            DriftLevel::OutControl => {
                self.counters.changes += 1;
                let fresh = self.fresh_learner();
                let promoted = std::mem::replace(&mut self.challenger, fresh);
                info!(
                    "Change detected, promoting challenger trained on {} instances",
                    promoted.training_weight_seen()
                );
                // The previous champion is dropped here.
                self.champion = promoted;
            }
        }

        self.champion.train(instance)
    }

    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        self.detector.output().to_votes().to_vec()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.champion.byte_size()
            + self.challenger.byte_size()
            + self.detector.byte_size()
    }

    fn training_weight_seen(&self) -> f64 {
        self.champion.training_weight_seen()
    }

    /// Drains the change and warning counters.
    fn model_measurements(&mut self) -> Vec<Measurement> {
        let counters = self.counters.drain();
        let mut measurements = vec![
            Measurement::new("change detected", counters.changes as f64),
            Measurement::new("warning detected", counters.warnings as f64),
        ];
        measurements.extend(self.champion.model_measurements());
        measurements
    }

    fn description(&self) -> String {
        format!(
            "DriftAdaptiveClassifier(base_learner={}, detector={})",
            self.base_learner.description(),
            self.detector_prototype.description()
        )
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::testing::ScriptedDetector;
    use crate::drift::DetectorOutput;
    use crate::learner::testing::ConstantLearner;
    use crate::metric::find_measurement;

    const NONE: (bool, bool) = (false, false);
    const WARN: (bool, bool) = (false, true);
    const CHANGE: (bool, bool) = (true, false);

    fn classifier(script: &[(bool, bool)]) -> DriftAdaptiveClassifier {
        DriftAdaptiveClassifier::new(
            Box::new(ConstantLearner::new(0, 2)),
            Box::new(ScriptedDetector::from_flags(script)),
        )
    }

    fn sample() -> Instance {
        Instance::new(vec![0.5], 1.0)
    }

    fn run(c: &mut DriftAdaptiveClassifier, n: usize) {
        for _ in 0..n {
            c.train(&sample()).unwrap();
        }
    }

    #[test]
    fn test_reset_state() {
        let c = classifier(&[]);
        assert_eq!(c.level(), DriftLevel::InControl);
        assert_eq!(c.champion().training_weight_seen(), 0.0);
        assert_eq!(c.challenger().training_weight_seen(), 0.0);
        assert!(!c.challenger_armed());
        assert_eq!(c.counters(), DetectionCounters::default());
    }

    #[test]
    fn test_champion_always_trained() {
        let mut c = classifier(&[NONE, WARN, NONE]);
        run(&mut c, 3);
        assert_eq!(c.champion().training_weight_seen(), 3.0);
        assert_eq!(c.challenger().training_weight_seen(), 1.0);
    }

    #[test]
    fn test_warning_resets_challenger_once() {
        let mut c = classifier(&[NONE, WARN, WARN, WARN]);
        run(&mut c, 1);
        assert!(c.challenger_armed());
        run(&mut c, 3);
        assert!(!c.challenger_armed());
        assert_eq!(c.level(), DriftLevel::Warning);
        assert_eq!(c.challenger().training_weight_seen(), 3.0);
        assert_eq!(c.counters().warnings, 1);
    }

    #[test]
    fn test_new_excursion_restarts_challenger() {
        let mut c = classifier(&[NONE, WARN, WARN, NONE, WARN]);
        run(&mut c, 3);
        assert_eq!(c.challenger().training_weight_seen(), 2.0);
        run(&mut c, 2);
        assert_eq!(c.challenger().training_weight_seen(), 1.0);
        assert_eq!(c.counters().warnings, 2);
    }

    #[test]
    fn test_promotion() {
        let mut c = classifier(&[NONE, WARN, WARN, WARN, CHANGE]);
        run(&mut c, 4);
        assert_eq!(c.challenger().training_weight_seen(), 3.0);
        assert_eq!(c.champion().training_weight_seen(), 4.0);

        run(&mut c, 1);
        assert_eq!(c.level(), DriftLevel::OutControl);
        // The promoted challenger is also trained on the instance that triggered the change.
        assert_eq!(c.champion().training_weight_seen(), 4.0);
        assert_eq!(c.challenger().training_weight_seen(), 0.0);
        assert_eq!(c.counters().changes, 1);

        run(&mut c, 1);
        assert_eq!(c.counters().changes, 1);
        assert_eq!(c.level(), DriftLevel::InControl);
    }

    #[test]
    fn test_change_supersedes_warning() {
        let script = vec![DetectorOutput {
            is_change: true,
            is_warning: true,
            delay: 0.0,
            estimation: 0.0,
        }];
        let mut c = DriftAdaptiveClassifier::new(
            Box::new(ConstantLearner::new(0, 2)),
            Box::new(ScriptedDetector::new(script)),
        );
        run(&mut c, 1);
        assert_eq!(c.level(), DriftLevel::OutControl);
        assert_eq!(c.counters().changes, 1);
        assert_eq!(c.predict(&sample()), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_counters_drain() {
        let mut c = classifier(&[NONE, WARN, CHANGE, NONE, WARN]);
        run(&mut c, 5);
        let ms = c.model_measurements();
        assert_eq!(find_measurement(&ms, "change detected").map(|m| m.value), Some(1.0));
        assert_eq!(find_measurement(&ms, "warning detected").map(|m| m.value), Some(2.0));
        let ms = c.model_measurements();
        assert_eq!(find_measurement(&ms, "change detected").map(|m| m.value), Some(0.0));
        assert_eq!(find_measurement(&ms, "warning detected").map(|m| m.value), Some(0.0));
    }

    #[test]
    fn test_unlabelled_instances_ignored() {
        let mut c = classifier(&[CHANGE]);
        c.train(&Instance::unlabelled(vec![0.5])).unwrap();
        assert_eq!(c.level(), DriftLevel::InControl);
        assert_eq!(c.champion().training_weight_seen(), 0.0);
    }

    #[test]
    fn test_predict_reports_detector_output() {
        let mut c = classifier(&[WARN]);
        run(&mut c, 1);
        assert_eq!(c.predict(&sample()), vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(c.champion_votes(&sample()), vec![1.0, 0.0]);
    }
}
