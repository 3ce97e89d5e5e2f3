//! Tree-ensemble backend: mean of regression-tree outputs, as exported from a
//! random-forest regressor.
//!
//! Each tree is a flat node array with node 0 as the root. Split nodes send a
//! sample left when `x[feature] <= threshold`. Children always sit at higher
//! indices than their parent, which [`ForestModel::new`] checks, so evaluation
//! always terminates.

use serde::{Deserialize, Serialize};
use upi_core::features::{FeatureRecord, FEATURE_COUNT};
use upi_core::inference::{AmountModel, InferenceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, tree_idx: usize) -> Result<(), InferenceError> {
        let invalid = |msg: String| InferenceError::InferenceFailure(format!("tree {tree_idx}: {msg}"));

        if self.nodes.is_empty() {
            return Err(invalid("no nodes".to_string()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= FEATURE_COUNT {
                        return Err(invalid(format!("node {idx} splits on feature {feature}")));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!("node {idx} has a non-finite threshold")));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(invalid(format!("node {idx} has invalid child {child}")));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(invalid(format!("leaf {idx} is not finite")));
                    }
                }
            }
        }
        Ok(())
    }

    fn evaluate(&self, x: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(InferenceError::InferenceFailure(format!(
                        "node {idx} out of bounds"
                    )))
                }
            }
        }
    }
}

pub struct ForestModel {
    name: String,
    trees: Vec<RegressionTree>,
}

impl ForestModel {
    pub fn new(name: impl Into<String>, trees: Vec<RegressionTree>) -> Result<Self, InferenceError> {
        if trees.is_empty() {
            return Err(InferenceError::InferenceFailure(
                "forest has no trees".to_string(),
            ));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(Self {
            name: name.into(),
            trees,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl AmountModel for ForestModel {
    fn predict(&self, features: &FeatureRecord) -> Result<f64, InferenceError> {
        let x = features.to_array();
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(&x)?;
        }
        let value = sum / self.trees.len() as f64;
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
        FEATURE_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use upi_core::features::EncodedContext;
    use upi_core::types::UserProfile;

    fn record(avg_amount: f64, hour: i64) -> FeatureRecord {
        let profile = UserProfile {
            avg_amount,
            median_amount: avg_amount,
            amount_std: 10.0,
            transaction_count: 20,
            avg_hour: 12.0,
            weekend_ratio: 0.2,
            cluster: None,
            preferred_category: None,
        };
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        FeatureRecord::build(&profile, EncodedContext::default(), hour, date).unwrap()
    }

    fn stump(feature: usize, threshold: f64, low: f64, high: f64) -> RegressionTree {
        RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: low },
                TreeNode::Leaf { value: high },
            ],
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = ForestModel::new(
            "rf",
            vec![stump(0, 500.0, 200.0, 900.0), stump(11, 18.0, 100.0, 300.0)],
        )
        .unwrap();
        assert_eq!(forest.n_trees(), 2);
        // avg 300 -> 200, hour 13 -> 100
        assert_eq!(forest.predict(&record(300.0, 13)).unwrap(), 150.0);
        // avg 800 -> 900, hour 20 -> 300
        assert_eq!(forest.predict(&record(800.0, 20)).unwrap(), 600.0);
    }

    #[test]
    fn test_threshold_is_inclusive_left() {
        let forest = ForestModel::new("rf", vec![stump(0, 500.0, 1.0, 2.0)]).unwrap();
        assert_eq!(forest.predict(&record(500.0, 12)).unwrap(), 1.0);
    }

    #[test]
    fn test_rejects_backward_child() {
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { value: 1.0 },
            ],
        };
        assert!(ForestModel::new("rf", vec![tree]).is_err());
    }

    #[test]
    fn test_rejects_unknown_feature_and_empty_forest() {
        assert!(ForestModel::new("rf", vec![stump(FEATURE_COUNT, 1.0, 1.0, 2.0)]).is_err());
        assert!(ForestModel::new("rf", vec![]).is_err());
    }

    #[test]
    fn test_nodes_deserialize_untagged() {
        let tree: RegressionTree = serde_json::from_str(
            r#"{"nodes": [{"feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                          {"value": 10.0}, {"value": 20.0}]}"#,
        )
        .unwrap();
        assert_eq!(tree, stump(0, 1.5, 10.0, 20.0));
    }
}
