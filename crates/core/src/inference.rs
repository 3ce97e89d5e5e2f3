//! Model-agnostic amount regression abstraction.
//!
//! Every trained model backend (linear, tree ensemble) implements the
//! [`AmountModel`] trait, so the predictor and engine never depend on how a
//! model was trained or serialized.

use crate::features::FeatureRecord;
use std::fmt;

/// A trained regressor mapping a feature record to a transaction amount.
pub trait AmountModel: Send + Sync {
    /// Predict a raw (unclamped) amount for one feature record.
    fn predict(&self, features: &FeatureRecord) -> Result<f64, InferenceError>;

    /// Model name for metrics/logging.
    fn model_name(&self) -> &str;

    /// Number of input features the model was trained on.
    fn n_features(&self) -> usize;
}

/// Errors that can occur while invoking a model.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The model was trained on a different feature layout.
    FeatureMismatch { expected: usize, got: usize },
    /// The model produced NaN or an infinite value.
    NonFiniteOutput(f64),
    /// Model evaluation failed.
    InferenceFailure(String),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::FeatureMismatch { expected, got } => {
                write!(f, "feature mismatch: expected={expected}, got={got}")
            }
            InferenceError::NonFiniteOutput(value) => {
                write!(f, "non-finite model output: {value}")
            }
            InferenceError::InferenceFailure(msg) => write!(f, "inference failure: {msg}"),
        }
    }
}

impl std::error::Error for InferenceError {}
