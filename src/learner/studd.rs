//! Student-Teacher Drift Detection
//!
//! A teacher model is trained on a labelled bootstrap batch and a student
//! model is trained to mimic the teacher's predictions. Afterwards no labels
//! are needed: a change detector monitors how often the student disagrees
//! with the teacher, and a detected change rebuilds both models from the
//! recent history.
use crate::data::Instance;
use crate::drift::ChangeDetector;
use crate::errors::DriftError;
use crate::learner::{DetectionCounters, Learner};
use crate::metric::Measurement;
use crate::utils::{items_to_strings, max_index, validate_positive_usize_parameter};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::str::FromStr;

/// Which samples are kept to rebuild the models after a change.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum StuddMode {
    /// Keep the most recent `batch_width` samples.
    #[default]
    SlidingWindow,
    /// Keep every sample since the last rebuild. The teacher is rebuilt from
    /// the most recent `batch_width` of them, the student from all of them.
    ReplayBuffer,
}

impl FromStr for StuddMode {
    type Err = DriftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SlidingWindow" => Ok(StuddMode::SlidingWindow),
            "ReplayBuffer" => Ok(StuddMode::ReplayBuffer),
            _ => Err(DriftError::ParseString(
                s.to_string(),
                "StuddMode".to_string(),
                items_to_strings(vec!["SlidingWindow", "ReplayBuffer"]),
            )),
        }
    }
}

#[derive(Clone)]
pub struct StuddLearner {
    teacher_prototype: Box<dyn Learner>,
    student_prototype: Box<dyn Learner>,
    detector_prototype: Box<dyn ChangeDetector>,
    teacher: Box<dyn Learner>,
    student: Box<dyn Learner>,
    detector: Box<dyn ChangeDetector>,
    batch_width: usize,
    mode: StuddMode,
    history: VecDeque<Instance>,
    processed: usize,
    trained: bool,
    in_warning: bool,
    counters: DetectionCounters,
}

impl StuddLearner {
    /// Create a learner.
    ///
    /// * `teacher` - Model trained on labelled data.
    /// * `student` - Model trained on the teacher's predictions.
    /// * `detector` - Monitors the student/teacher disagreement.
    /// * `batch_width` - Size of the labelled bootstrap batch and of the rebuild window.
    pub fn new(
        teacher: Box<dyn Learner>,
        student: Box<dyn Learner>,
        detector: Box<dyn ChangeDetector>,
        batch_width: usize,
    ) -> Result<Self, DriftError> {
        validate_positive_usize_parameter(batch_width, "batch_width")?;
        let mut learner = StuddLearner {
            teacher: teacher.box_clone(),
            student: student.box_clone(),
            detector: detector.clone_box(),
            teacher_prototype: teacher,
            student_prototype: student,
            detector_prototype: detector,
            batch_width,
            mode: StuddMode::default(),
            history: VecDeque::new(),
            processed: 0,
            trained: false,
            in_warning: false,
            counters: DetectionCounters::default(),
        };
        learner.reset();
        Ok(learner)
    }

    pub fn set_mode(mut self, mode: StuddMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> StuddMode {
        self.mode
    }

    pub fn batch_width(&self) -> usize {
        self.batch_width
    }

    /// Whether the bootstrap batch has been used to build the student.
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn teacher(&self) -> &dyn Learner {
        self.teacher.as_ref()
    }

    pub fn student(&self) -> &dyn Learner {
        self.student.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn counters(&self) -> DetectionCounters {
        self.counters
    }

    fn teacher_class(&self, instance: &Instance) -> usize {
        max_index(&self.teacher.predict(instance))
    }

    /// Train the student on `samples` relabelled by the current teacher.
    fn fit_student<'a, I>(&mut self, samples: I) -> Result<(), DriftError>
    where
        I: Iterator<Item = &'a Instance>,
    {
        for sample in samples {
            let pseudo = sample.relabelled(self.teacher_class(sample) as f64);
            self.student.train(&pseudo)?;
        }
        Ok(())
    }

    fn push_history(&mut self, instance: &Instance) {
        self.history.push_back(instance.clone());
        if self.mode == StuddMode::SlidingWindow {
            while self.history.len() > self.batch_width {
                self.history.pop_front();
            }
        }
    }

    fn rebuild(&mut self) -> Result<(), DriftError> {
        self.teacher.reset();
        self.student.reset();
        let start = self.history.len().saturating_sub(self.batch_width);
        let history = std::mem::take(&mut self.history);
        for sample in history.range(start..) {
            if sample.is_labelled() {
                self.teacher.train(sample)?;
            }
        }
        self.fit_student(history.iter())?;
        info!(
            "Change detected, rebuilt teacher on {} and student on {} samples",
            history.len() - start,
            history.len()
        );
        if self.mode == StuddMode::SlidingWindow {
            self.history = history;
        }
        Ok(())
    }
}

impl Learner for StuddLearner {
    fn reset(&mut self) {
        self.teacher = self.teacher_prototype.box_clone();
        self.teacher.reset();
        self.student = self.student_prototype.box_clone();
        self.student.reset();
        self.detector = self.detector_prototype.clone_box();
        self.detector.reset();
        self.history.clear();
        self.processed = 0;
        self.trained = false;
        self.in_warning = false;
        self.counters = DetectionCounters::default();
    }

    fn train(&mut self, instance: &Instance) -> Result<(), DriftError> {
        if !self.trained {
            // Unlabelled samples cannot teach anything during the bootstrap.
            if !instance.is_labelled() {
                return Ok(());
            }
            self.processed += 1;
            if self.processed < self.batch_width {
                self.teacher.train(instance)?;
                self.history.push_back(instance.clone());
            } else {
                let batch = std::mem::take(&mut self.history);
                self.fit_student(batch.iter())?;
                self.trained = true;
                debug!("Student built from a bootstrap batch of {} samples", batch.len());
                if self.mode == StuddMode::SlidingWindow {
                    self.history = batch;
                }
            }
            return Ok(());
        }

        self.processed += 1;
        let teacher_class = self.teacher_class(instance);
        let pseudo = instance.relabelled(teacher_class as f64);
        let student_class = max_index(&self.student.predict(&pseudo));
        self.detector
            .input(if teacher_class != student_class { 1.0 } else { 0.0 })?;
        self.push_history(instance);

        if self.detector.warning_zone() && !self.detector.change_detected() {
            if !self.in_warning {
                self.counters.warnings += 1;
            }
            self.in_warning = true;
        } else {
            self.in_warning = false;
        }

        if self.detector.change_detected() {
            self.counters.changes += 1;
            self.rebuild()?;
        }
        Ok(())
    }

    fn predict(&self, _instance: &Instance) -> Vec<f64> {
        self.detector.output().to_votes().to_vec()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.teacher.byte_size()
            + self.student.byte_size()
            + self.detector.byte_size()
            + self.history.iter().map(|i| i.byte_size()).sum::<usize>()
    }

    fn training_weight_seen(&self) -> f64 {
        self.teacher.training_weight_seen()
    }

    fn model_measurements(&mut self) -> Vec<Measurement> {
        let counters = self.counters.drain();
        vec![
            Measurement::new("change detected", counters.changes as f64),
            Measurement::new("warning detected", counters.warnings as f64),
        ]
    }

    fn description(&self) -> String {
        format!(
            "StuddLearner(teacher={}, student={}, detector={}, batch_width={}, mode={:?})",
            self.teacher_prototype.description(),
            self.student_prototype.description(),
            self.detector_prototype.description(),
            self.batch_width,
            self.mode
        )
    }

    fn box_clone(&self) -> Box<dyn Learner> {
        Box::new(self.clone())
    }
}
