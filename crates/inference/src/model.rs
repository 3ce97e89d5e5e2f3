//! Trained amount-regression artifacts.
//!
//! Training happens offline; this module only deserializes an exported
//! artifact and turns it into a ready [`AmountModel`]. The artifact is JSON,
//! tagged by `kind`:
//!
//! ```json
//! {"kind": "linear", "intercept": 42.0, "coefficients": [/* 15 values */]}
//! {"kind": "forest", "trees": [{"nodes": [/* split / leaf nodes */]}]}
//! ```

use crate::backends::forest::{ForestModel, RegressionTree};
use crate::backends::linear::LinearModel;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use upi_core::inference::AmountModel;
use upi_core::{RecommenderError, RecommenderResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear {
        #[serde(default = "default_linear_name")]
        name: String,
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        #[serde(default = "default_forest_name")]
        name: String,
        trees: Vec<RegressionTree>,
    },
}

fn default_linear_name() -> String {
    "linear_regression".to_string()
}
fn default_forest_name() -> String {
    "random_forest".to_string()
}

impl ModelArtifact {
    /// Validate the artifact and build the model it describes.
    pub fn into_model(self) -> RecommenderResult<Arc<dyn AmountModel>> {
        let model: Arc<dyn AmountModel> = match self {
            ModelArtifact::Linear {
                name,
                intercept,
                coefficients,
            } => Arc::new(
                LinearModel::new(name, intercept, coefficients)
                    .map_err(|e| RecommenderError::ModelLoad(e.to_string()))?,
            ),
            ModelArtifact::Forest { name, trees } => Arc::new(
                ForestModel::new(name, trees)
                    .map_err(|e| RecommenderError::ModelLoad(e.to_string()))?,
            ),
        };
        Ok(model)
    }
}

/// Load and validate a model artifact from disk.
pub fn load_model(path: impl AsRef<Path>) -> RecommenderResult<Arc<dyn AmountModel>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| RecommenderError::ModelLoad(format!("{}: {e}", path.display())))?;
    let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| RecommenderError::ModelLoad(format!("{}: {e}", path.display())))?;

    let model = artifact.into_model()?;
    info!(
        path = %path.display(),
        model = model.model_name(),
        n_features = model.n_features(),
        "Amount model loaded"
    );
    Ok(model)
}
