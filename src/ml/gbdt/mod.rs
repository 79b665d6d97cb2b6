//! Gradient-boosted decision trees for binary classification.
//!
//! Depth-limited regression trees fitted with second-order logistic
//! boosting over histogram-binned features. Supports:
//! - Row and column subsampling from an explicit seeded rng.
//! - L1/L2 leaf regularization and a minimum-hessian split constraint.
//! - Reproducible binary model export/load with structural validation.

mod model;
mod train;

pub use model::{GbdtModel, MODEL_VERSION, Tree, TreeNode, sigmoid};
pub use train::{TrainDataset, TrainOptions, train_gbdt};
