//! Amount prediction with the business floor/ceiling.

use crate::jitter::UniformJitter;
use std::sync::Arc;
use upi_core::features::FeatureRecord;
use upi_core::inference::{AmountModel, InferenceError};

/// Smallest amount ever recommended.
pub const MIN_AMOUNT: f64 = 10.0;
/// Largest amount ever recommended.
pub const MAX_AMOUNT: f64 = 10_000.0;

/// Name reported when no trained model is attached.
pub const BASELINE_NAME: &str = "statistical_baseline";

pub fn clamp_amount(amount: f64) -> f64 {
    amount.clamp(MIN_AMOUNT, MAX_AMOUNT)
}

/// Wraps the optional trained model. Without a model every prediction is the
/// user's average amount scaled by `U(0.8, 1.2)`.
pub struct AmountPredictor {
    model: Option<Arc<dyn AmountModel>>,
    jitter: Arc<UniformJitter>,
}

impl AmountPredictor {
    pub fn new(model: Option<Arc<dyn AmountModel>>, jitter: Arc<UniformJitter>) -> Self {
        Self { model, jitter }
    }

    /// Predict an amount, always clamped to `[MIN_AMOUNT, MAX_AMOUNT]`.
    pub fn predict(
        &self,
        features: &FeatureRecord,
        user_avg_amount: f64,
    ) -> Result<f64, InferenceError> {
        let raw = match &self.model {
            Some(model) => model.predict(features)?,
            None => user_avg_amount * self.jitter.sample(),
        };
        if !raw.is_finite() {
            return Err(InferenceError::NonFiniteOutput(raw));
        }
        Ok(clamp_amount(raw))
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_ref()
            .map(|m| m.model_name())
            .unwrap_or(BASELINE_NAME)
    }
}
