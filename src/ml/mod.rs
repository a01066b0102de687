// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Everything that turns scraped examples into a trained model
// and measures it:
//
//   features.rs  — Feature functions and the FeatureExtractor
//                  seam. A FeatureSet is an ordered, serialisable
//                  list of label-gated indicators.
//
//   model.rs     — The log-linear model: weights, scores,
//                  P(cv | x) over a candidate label set and its
//                  gradient
//
//   trainer.rs   — L-BFGS on the regularised log-likelihood,
//                  with the objective and gradient computed by a
//                  fixed pool of rayon workers
//
//   evaluator.rs — Thresholded accuracy and the list of
//                  low-confidence examples
//
//   error.rs     — TrainError, the errors that abort a run
//
// Reference: Berger et al. (1996) A Maximum Entropy Approach to NLP
//            Nocedal & Wright (2006) Numerical Optimization

/// Training and scoring errors
pub mod error;

/// Feature functions and feature sets
pub mod features;

/// Log-linear model
pub mod model;

/// Parallel L-BFGS trainer
pub mod trainer;

/// Thresholded accuracy report
pub mod evaluator;
