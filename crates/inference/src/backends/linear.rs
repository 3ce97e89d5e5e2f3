//! Linear regression backend: `intercept + coefficients · features`.

use ndarray::Array1;
use upi_core::features::{FeatureRecord, FEATURE_COUNT};
use upi_core::inference::{AmountModel, InferenceError};

pub struct LinearModel {
    name: String,
    intercept: f64,
    coefficients: Array1<f64>,
}

impl LinearModel {
    pub fn new(
        name: impl Into<String>,
        intercept: f64,
        coefficients: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        if coefficients.len() != FEATURE_COUNT {
            return Err(InferenceError::FeatureMismatch {
                expected: FEATURE_COUNT,
                got: coefficients.len(),
            });
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(InferenceError::InferenceFailure(
                "linear model has non-finite parameters".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            intercept,
            coefficients: Array1::from(coefficients),
        })
    }
}

impl AmountModel for LinearModel {
    fn predict(&self, features: &FeatureRecord) -> Result<f64, InferenceError> {
        let value = features.to_ndarray().dot(&self.coefficients) + self.intercept;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(InferenceError::NonFiniteOutput(value))
        }
    }

    fn model_name(&self) -> &str {
        &self.name
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}
