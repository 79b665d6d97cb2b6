use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model format version written into every artifact.
pub const MODEL_VERSION: i64 = 1;

/// Node of a regression tree, stored in a flat arena.
///
/// Children always sit at larger indices than their parent, so traversal
/// terminates for any validated tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: `feature <= threshold` routes left.
    Split {
        /// Feature index used for the split.
        feature_index: u16,
        /// Threshold in (standardized) feature units.
        threshold: f32,
        /// Arena index of the left child.
        left: u32,
        /// Arena index of the right child.
        right: u32,
    },
    /// Terminal node carrying an unscaled leaf weight.
    Leaf { value: f32 },
}

/// Depth-limited regression tree used as a weak learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Arena of nodes; index 0 is the root.
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Predict the leaf weight for a feature vector.
    pub fn predict(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature_index as usize).copied().unwrap_or(0.0);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                None => return 0.0,
            }
        }
    }

    fn validate(&self, tree_idx: usize, feature_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("Tree {tree_idx} has no nodes"));
        }
        for (node_idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature_index,
                left,
                right,
                ..
            } = node
            {
                let (left, right) = (*left as usize, *right as usize);
                if left <= node_idx || right <= node_idx {
                    return Err(format!(
                        "Tree {tree_idx} node {node_idx} has non-forward child indices"
                    ));
                }
                if left >= self.nodes.len() || right >= self.nodes.len() {
                    return Err(format!(
                        "Tree {tree_idx} node {node_idx} has out-of-range child indices"
                    ));
                }
                if *feature_index as usize >= feature_len {
                    return Err(format!(
                        "Tree {tree_idx} node {node_idx} splits on feature {} but the model has {}",
                        feature_index, feature_len
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted tree model for binary classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of `f32` values expected per feature vector.
    pub feature_len: usize,
    /// Learning rate applied to each tree's leaf weights.
    pub learning_rate: f32,
    /// Initial raw score before boosting rounds (logit of the base score).
    pub base_raw: f32,
    /// Fitted trees in boosting order.
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model version {} (expected {MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.feature_len == 0 {
            return Err("Model must expect at least one feature".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(tree_idx, self.feature_len)?;
        }
        Ok(())
    }

    /// Predict the raw (pre-sigmoid) score for a feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> f32 {
        let mut raw = self.base_raw;
        for tree in &self.trees {
            raw += self.learning_rate * tree.predict(features);
        }
        raw
    }

    /// Predict the positive-class probability for a feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        sigmoid(self.predict_raw(features))
    }

    /// Predict the hard label at the 0.5 probability threshold.
    pub fn predict_label(&self, features: &[f32]) -> u8 {
        u8::from(self.predict_proba(features) >= 0.5)
    }

    /// Serialize the model to `path`, creating parent directories.
    pub fn save_binary(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        let bytes = bincode::serialize(self).map_err(|err| err.to_string())?;
        std::fs::write(path, bytes).map_err(|err| err.to_string())
    }

    /// Load and validate a model from `path`.
    pub fn load_binary(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|err| err.to_string())?;
        let model: Self = bincode::deserialize(&bytes).map_err(|err| err.to_string())?;
        model.validate()?;
        Ok(model)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(raw: f32) -> f32 {
    if raw >= 0.0 {
        1.0 / (1.0 + (-raw).exp())
    } else {
        let e = raw.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn leaf(value: f32) -> TreeNode {
        TreeNode::Leaf { value }
    }

    fn small_model() -> GbdtModel {
        GbdtModel {
            model_version: MODEL_VERSION,
            feature_len: 2,
            learning_rate: 0.5,
            base_raw: 0.0,
            trees: vec![Tree {
                nodes: vec![
                    TreeNode::Split {
                        feature_index: 0,
                        threshold: 0.0,
                        left: 1,
                        right: 2,
                    },
                    leaf(-2.0),
                    leaf(2.0),
                ],
            }],
        }
    }

    #[test]
    fn tree_predict_routes_on_threshold() {
        let model = small_model();
        assert_eq!(model.trees[0].predict(&[0.0, 9.0]), -2.0);
        assert_eq!(model.trees[0].predict(&[0.1, 9.0]), 2.0);
    }

    #[test]
    fn predict_applies_learning_rate_and_sigmoid() {
        let model = small_model();
        assert_eq!(model.predict_raw(&[1.0, 0.0]), 1.0);
        assert!((model.predict_proba(&[1.0, 0.0]) - sigmoid(1.0)).abs() < 1e-6);
        assert_eq!(model.predict_label(&[1.0, 0.0]), 1);
        assert_eq!(model.predict_label(&[-1.0, 0.0]), 0);
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-100.0) >= 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn validate_rejects_backward_child_indices() {
        let mut model = small_model();
        model.trees[0].nodes[0] = TreeNode::Split {
            feature_index: 0,
            threshold: 0.0,
            left: 0,
            right: 2,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_feature() {
        let mut model = small_model();
        model.feature_len = 0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("siesta.bin");
        let model = small_model();
        model.save_binary(&path).unwrap();
        let loaded = GbdtModel::load_binary(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn load_rejects_garbage_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, b"not a model").unwrap();
        assert!(GbdtModel::load_binary(&path).is_err());
    }
}
