//! Machine learning building blocks for the training pipeline.
//!
//! Standardization, the gradient-boosted tree model/trainer, and the
//! evaluation metrics reported after a training run.

pub mod gbdt;
pub mod metrics;
pub mod standardize;
