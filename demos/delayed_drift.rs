use driftwatch::drift::DdmDetector;
use driftwatch::evaluation::harness::{INSTANCES_MEASUREMENT, RAM_HOURS_MEASUREMENT};
use driftwatch::evaluation::LabelingMode;
use driftwatch::learner::{NaiveBayes, StuddMode};
use driftwatch::stream::SyntheticDriftStream;
use driftwatch::{ConceptDriftEvaluator, DriftAdaptiveClassifier, EvaluationHarness, StuddLearner};
use std::error::Error;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    let drift_positions = vec![5_000, 10_000, 15_000];
    let drift_widths = vec![0, 500, 0];
    let n_instances = 20_000;

    println!("Learner,Labeling,True_Changes,Detected,Matched,Mean_Delay,RAM_Hours,Time_ms");

    let labelings = vec![
        (
            "delayed",
            LabelingMode::Delayed {
                delay_length: 100,
                initial_window: 1_000,
                train_on_initial_window: true,
                train_in_batches: false,
            },
        ),
        (
            "partial",
            LabelingMode::Partial {
                percentage_unlabelled: 50,
            },
        ),
    ];

    for (label, labeling) in labelings {
        let harness = EvaluationHarness::new(labeling)
            .set_sample_frequency(5_000)
            .set_train_on_unlabelled(true)
            .set_seed(42);

        let learners: Vec<(&str, Box<dyn driftwatch::Learner>)> = vec![
            (
                "DriftAdaptive",
                Box::new(DriftAdaptiveClassifier::new(
                    Box::new(NaiveBayes::new()),
                    Box::new(DdmDetector::default()),
                )),
            ),
            (
                "Studd",
                Box::new(
                    StuddLearner::new(
                        Box::new(NaiveBayes::new()),
                        Box::new(NaiveBayes::new()),
                        Box::new(DdmDetector::default()),
                        500,
                    )?
                    .set_mode(StuddMode::SlidingWindow),
                ),
            ),
        ];

        for (name, mut learner) in learners {
            let mut stream = SyntheticDriftStream::new(4, drift_positions.clone(), drift_widths.clone(), 7)?
                .set_noise(0.05)?
                .set_max_instances(Some(n_instances));
            let mut evaluator = ConceptDriftEvaluator::new();

            let start = Instant::now();
            let curve = harness.run(learner.as_mut(), &mut stream, &mut evaluator)?;
            let elapsed = start.elapsed().as_millis();

            let last = curve.last().ok_or("empty learning curve")?;
            println!(
                "{},{},{},{},{},{:.2},{:.3e},{}",
                name,
                label,
                evaluator.number_changes(),
                evaluator.number_detections(),
                evaluator.number_detections_occurred(),
                evaluator.total_delay() / evaluator.number_changes(),
                last.value(RAM_HOURS_MEASUREMENT).unwrap_or(0.0),
                elapsed
            );
            if let Some(instances) = last.value(INSTANCES_MEASUREMENT) {
                println!("# {} snapshots, last after {} instances", curve.len(), instances);
            }
        }
    }
    Ok(())
}
