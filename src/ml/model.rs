// ============================================================
// Layer 5 — Log-Linear Model
// ============================================================
// A conditional exponential-family model over correspondence
// labels:
//
//   score(cv, x) = w · f(cv, x)
//
//                    exp(score(cv, x))
//   P(cv | x)  =  ─────────────────────────
//                  Σ_{cv' ∈ C} exp(score(cv', x))
//
// where C is the candidate label set (a correspondence row).
// The max score over C is subtracted before exponentiating, so
// large weights cannot overflow.
//
// Gradient of log P(cv | x) with respect to w:
//
//   ∇ = f(cv, x) − Σ_{cv'} P(cv' | x) · f(cv', x)
//
// The weight vector is the only mutable state. Its length is fixed
// to the feature extractor's dimension when the model is built.
//
// Reference: Berger et al. (1996) A Maximum Entropy Approach to NLP

use std::sync::Arc;

use crate::data::example::ExampleContext;
use crate::domain::cv::Cv;
use crate::ml::error::TrainError;
use crate::ml::features::{FeatureExtractor, FeatureSet};

#[derive(Debug)]
pub struct Llm<F: FeatureExtractor = FeatureSet> {
    features: Arc<F>,
    weights:  Vec<f64>,
}

impl<F: FeatureExtractor> Clone for Llm<F> {
    fn clone(&self) -> Self {
        Self { features: Arc::clone(&self.features), weights: self.weights.clone() }
    }
}

impl<F: FeatureExtractor> Llm<F> {
    /// A model with every weight at zero
    pub fn new(features: Arc<F>) -> Self {
        let weights = vec![0.0; features.dimension()];
        Self { features, weights }
    }

    /// A model with the given weights; fails if the lengths disagree
    pub fn with_weights(features: Arc<F>, weights: Vec<f64>) -> Result<Self, TrainError> {
        if weights.len() != features.dimension() {
            return Err(TrainError::dimension_mismatch(features.dimension(), weights.len()));
        }
        Ok(Self { features, weights })
    }

    pub fn features(&self) -> &Arc<F> {
        &self.features
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Overwrite the weights in place (same length required)
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<(), TrainError> {
        if weights.len() != self.weights.len() {
            return Err(TrainError::dimension_mismatch(self.weights.len(), weights.len()));
        }
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    /// Feature vector for one label, checked against the weights
    pub fn feature_vector(&self, cv: Cv, x: &ExampleContext<'_>) -> Result<Vec<f64>, TrainError> {
        let f = self.features.extract(cv, x);
        if f.len() != self.weights.len() {
            return Err(TrainError::dimension_mismatch(self.weights.len(), f.len()));
        }
        Ok(f)
    }

    pub fn score(&self, cv: Cv, x: &ExampleContext<'_>) -> Result<f64, TrainError> {
        Ok(dot(&self.weights, &self.feature_vector(cv, x)?))
    }

    /// P(cv | x) normalised over `cvs`. A label outside `cvs` has
    /// probability zero.
    pub fn probability(&self, cv: Cv, x: &ExampleContext<'_>, cvs: &[Cv]) -> Result<f64, TrainError> {
        let Some(index) = cvs.iter().position(|&c| c == cv) else {
            return Ok(0.0);
        };
        let scores = cvs
            .iter()
            .map(|&c| self.score(c, x))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(softmax(&scores)[index])
    }

    pub fn log_probability(&self, cv: Cv, x: &ExampleContext<'_>, cvs: &[Cv]) -> Result<f64, TrainError> {
        let Some(index) = cvs.iter().position(|&c| c == cv) else {
            return Ok(f64::NEG_INFINITY);
        };
        let scores = cvs
            .iter()
            .map(|&c| self.score(c, x))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(log_softmax(&scores)[index])
    }

    /// ∂ log P(cv | x) / ∂w, normalised over `cvs`
    pub fn gradient(&self, x: &ExampleContext<'_>, cv: Cv, cvs: &[Cv]) -> Result<Vec<f64>, TrainError> {
        let index = cvs
            .iter()
            .position(|&c| c == cv)
            .ok_or(TrainError::LabelOutsideCandidates { label: cv })?;
        let vectors = cvs
            .iter()
            .map(|&c| self.feature_vector(c, x))
            .collect::<Result<Vec<_>, _>>()?;
        let (_, gradient) = log_likelihood_term(&self.weights, &vectors, index);
        Ok(gradient)
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Max-shifted softmax
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max  = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

pub(crate) fn log_softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let log_z = max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
    scores.iter().map(|s| s - log_z).collect()
}

/// Log-probability of label `index` and its gradient, given one
/// feature vector per candidate label.
pub(crate) fn log_likelihood_term(weights: &[f64], vectors: &[Vec<f64>], index: usize) -> (f64, Vec<f64>) {
    let mut gradient = vec![0.0; weights.len()];
    let log_p = accumulate_log_likelihood(weights, vectors, index, &mut gradient);
    (log_p, gradient)
}

/// Same as `log_likelihood_term`, but adds the gradient into `gradient`
/// instead of allocating one.
pub(crate) fn accumulate_log_likelihood(
    weights:  &[f64],
    vectors:  &[Vec<f64>],
    index:    usize,
    gradient: &mut [f64],
) -> f64 {
    let scores: Vec<f64> = vectors.iter().map(|f| dot(weights, f)).collect();
    let probs = softmax(&scores);

    for (g, v) in gradient.iter_mut().zip(&vectors[index]) {
        *g += v;
    }
    for (f, p) in vectors.iter().zip(&probs) {
        for (g, v) in gradient.iter_mut().zip(f) {
            *g -= p * v;
        }
    }
    log_softmax(&scores)[index]
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grounding::{Grounding, Object, Region};
    use crate::domain::phrase::Phrase;
    use crate::domain::world::World;
    use crate::ml::features::Feature;

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

        fn context(&self) -> ExampleContext<'_> {
            ExampleContext {
                grounding: &self.grounding,
                phrase:    &self.phrase,
                world:     &self.world,
                cvs:       &Cv::BINARY,
                source:    "t",
                children:  Vec::new(),
            }
        }
    }

    fn single_feature() -> Arc<FeatureSet> {
        Arc::new(FeatureSet::new(vec![Feature::Bias { cv: Cv::True }]))
    }

    #[test]
    fn test_zero_weights_give_uniform_probability() {
        let fx  = Fixture::new();
        let llm = Llm::new(single_feature());
        let p   = llm.probability(Cv::True, &fx.context(), &Cv::BINARY).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_probability_is_logistic_in_weight() {
        let fx  = Fixture::new();
        let llm = Llm::with_weights(single_feature(), vec![2.0]).unwrap();
        let p   = llm.probability(Cv::True, &fx.context(), &Cv::BINARY).unwrap();
        let expected = 1.0 / (1.0 + (-2.0f64).exp());
        assert!((p - expected).abs() < 1e-12);

        let q = llm.probability(Cv::False, &fx.context(), &Cv::BINARY).unwrap();
        assert!((p + q - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_large_scores_do_not_overflow() {
        let fx  = Fixture::new();
        let llm = Llm::with_weights(single_feature(), vec![5_000.0]).unwrap();
        let p   = llm.probability(Cv::True, &fx.context(), &Cv::BINARY).unwrap();
        assert!(p.is_finite());
        assert!((p - 1.0).abs() < 1e-12);
        let lp = llm.log_probability(Cv::False, &fx.context(), &Cv::BINARY).unwrap();
        assert!((lp + 5_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_outside_candidates() {
        let fx  = Fixture::new();
        let llm = Llm::new(single_feature());
        assert_eq!(llm.probability(Cv::Unknown, &fx.context(), &Cv::BINARY).unwrap(), 0.0);
        assert!(matches!(
            llm.gradient(&fx.context(), Cv::Unknown, &Cv::BINARY),
            Err(TrainError::LabelOutsideCandidates { .. })
        ));
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let fx = Fixture::new();
        let x  = fx.context();
        let w  = 0.7;
        let h  = 1e-5;

        for label in Cv::BINARY {
            let llm = Llm::with_weights(single_feature(), vec![w]).unwrap();
            let analytic = llm.gradient(&x, label, &Cv::BINARY).unwrap()[0];

            let up   = Llm::with_weights(single_feature(), vec![w + h]).unwrap();
            let down = Llm::with_weights(single_feature(), vec![w - h]).unwrap();
            let numeric = (up.log_probability(label, &x, &Cv::BINARY).unwrap()
                - down.log_probability(label, &x, &Cv::BINARY).unwrap())
                / (2.0 * h);

            assert!(
                (analytic - numeric).abs() < 1e-6,
                "label {label:?}: analytic {analytic} vs numeric {numeric}"
            );
        }
    }

    #[test]
    fn test_weight_length_is_checked() {
        let err = Llm::with_weights(single_feature(), vec![0.0, 1.0]).unwrap_err();
        assert!(matches!(err, TrainError::DimensionMismatch { expected: 1, actual: 2 }));

        let mut llm = Llm::new(single_feature());
        assert!(llm.set_weights(&[1.0, 2.0]).is_err());
        llm.set_weights(&[3.0]).unwrap();
        assert_eq!(llm.weights(), &[3.0]);
    }
}
