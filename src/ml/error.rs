//! Error types for model training and scoring.

use thiserror::Error;

use crate::domain::cv::Cv;

/// Errors that abort a training run. Low-confidence examples and
/// running out of iterations are not errors.
#[derive(Debug, Error)]
pub enum TrainError {
    /// Feature vector length disagrees with the weight vector length.
    #[error("Dimension mismatch: expected {expected}, actual {actual}")]
    DimensionMismatch {
        /// Length of the model's weight vector
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// An example's label is not in its candidate label set.
    #[error("Label {label:?} is not among the example's candidate labels")]
    LabelOutsideCandidates { label: Cv },

    /// A trainer option is outside its allowed range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The worker thread pool could not be started.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrainError {
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }
}
