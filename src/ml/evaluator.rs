// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores every example with a trained model and counts how many
// the model is confident about:
//
//   p = P(label | context) over the binary labels {0, 1}
//   p ≥ threshold → correct
//   p <  threshold → misclassified (reported for inspection)
//
// Accuracy is correct / total × 100, and 0.0 for an empty
// example set. Evaluation reads the model only, so running it
// twice gives the same report.

use std::fmt;

use serde::Serialize;

use crate::data::example::LabeledExample;
use crate::domain::cv::Cv;
use crate::ml::error::TrainError;
use crate::ml::features::FeatureExtractor;
use crate::ml::model::Llm;

/// Confidence at or above which an example counts as correct
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// One example the model was not confident about
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misclassified {
    /// Position in the evaluated example list
    pub index:       usize,
    pub probability: f64,
    pub label:       Cv,
    pub source:      String,
    pub grounding:   String,
    pub phrase:      String,
    pub children:    Vec<String>,
}

impl fmt::Display for Misclassified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "example[{}] P(cv={})={:.4} ({})", self.index, self.label, self.probability, self.source)?;
        writeln!(f, "  grounding: {}", self.grounding)?;
        for child in &self.children {
            writeln!(f, "  child:     {child}")?;
        }
        write!(f, "  phrase:    {}", self.phrase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub correct:      usize,
    pub total:        usize,
    pub accuracy:     f64,
    pub threshold:    f64,
    pub misclassified: Vec<Misclassified>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} accuracy ({}/{})", self.accuracy, self.correct, self.total)
    }
}

pub fn evaluate<F: FeatureExtractor>(
    model:     &Llm<F>,
    examples:  &[LabeledExample<'_>],
    threshold: f64,
) -> Result<EvaluationReport, TrainError> {
    let mut correct = 0;
    let mut misclassified = Vec::new();

    for (index, example) in examples.iter().enumerate() {
        let x = &example.context;
        let probability = model.probability(example.label, x, &Cv::BINARY)?;
        if probability >= threshold {
            correct += 1;
            continue;
        }
        tracing::debug!("example[{}] below threshold: P={:.4}", index, probability);
        misclassified.push(Misclassified {
            index,
            probability,
            label:     example.label,
            source:    x.source.to_string(),
            grounding: x.grounding.to_string(),
            phrase:    x.phrase.to_string(),
            children:  x.children.iter().map(|g| g.to_string()).collect(),
        });
    }

    let total = examples.len();
    let accuracy = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };

    Ok(EvaluationReport { correct, total, accuracy, threshold, misclassified })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::data::example::ExampleContext;
    use crate::domain::grounding::{Grounding, Object, Region};
    use crate::domain::phrase::Phrase;
    use crate::domain::world::World;
    use crate::ml::features::{Feature, FeatureSet};

    struct Fixture {
        grounding: Grounding,
        phrase:    Phrase,
        world:     World,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                grounding: Grounding::Region(Region::new("near", Object::new("box1", "box"))),
                phrase:    Phrase::new("PP", "near the box"),
                world:     World::default(),
            }
        }

        fn example(&self, label: Cv) -> LabeledExample<'_> {
            LabeledExample::new(
                label,
                ExampleContext {
                    grounding: &self.grounding,
                    phrase:    &self.phrase,
                    world:     &self.world,
                    cvs:       &Cv::BINARY,
                    source:    "scene.json",
                    children:  Vec::new(),
                },
            )
        }
    }

    /// P(True) = logistic(weight)
    fn model(weight: f64) -> Llm {
        let features = Arc::new(FeatureSet::new(vec![Feature::Bias { cv: Cv::True }]));
        Llm::with_weights(features, vec![weight]).unwrap()
    }

    fn logit(p: f64) -> f64 {
        (p / (1.0 - p)).ln()
    }

    #[test]
    fn test_confident_example_is_correct() {
        let fx = Fixture::new();
        let report = evaluate(&model(logit(0.9)), &[fx.example(Cv::True)], DEFAULT_THRESHOLD).unwrap();
        assert_eq!(report.correct, 1);
        assert!(report.misclassified.is_empty());
        assert_eq!(report.accuracy, 100.0);
    }

    #[test]
    fn test_uncertain_example_is_misclassified() {
        let fx = Fixture::new();
        let report = evaluate(&model(0.0), &[fx.example(Cv::True)], DEFAULT_THRESHOLD).unwrap();
        assert_eq!(report.correct, 0);
        assert_eq!(report.misclassified.len(), 1);

        let miss = &report.misclassified[0];
        assert_eq!(miss.index, 0);
        assert!((miss.probability - 0.5).abs() < 1e-12);
        assert_eq!(miss.source, "scene.json");
        assert_eq!(miss.phrase, "PP(\"near the box\")");
    }

    #[test]
    fn test_accuracy_is_a_percentage() {
        let fx = Fixture::new();
        let examples = [fx.example(Cv::True), fx.example(Cv::False)];
        let report = evaluate(&model(logit(0.9)), &examples, DEFAULT_THRESHOLD).unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 2);
        assert!((report.accuracy - 50.0).abs() < 1e-12);
        assert_eq!(report.to_string(), "50.00 accuracy (1/2)");
        assert_eq!(report.misclassified[0].index, 1);
    }

    #[test]
    fn test_empty_set_has_zero_accuracy() {
        let report = evaluate(&model(1.0), &[], DEFAULT_THRESHOLD).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let fx = Fixture::new();
        let examples = [fx.example(Cv::True), fx.example(Cv::False), fx.example(Cv::True)];
        let m = model(0.3);
        let a = evaluate(&m, &examples, 0.5).unwrap();
        let b = evaluate(&m, &examples, 0.5).unwrap();
        assert_eq!(a, b);
        assert_eq!(m.weights(), &[0.3]);
    }
}
