//! End-to-end training orchestration.
//!
//! One-shot batch run: load the feature CSV, split it protein-aware,
//! extract and standardize the fixed feature columns, fit the boosted
//! classifier, report held-out metrics, and persist the model. The fitted
//! standardizer is intentionally not persisted alongside the model; the
//! saved artifact matches what the original tooling produced.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::dataset::loader::{TableLoadError, load_features_csv};
use crate::dataset::matrix::{ExtractError, FEATURE_COLUMNS, GROUP_COLUMN, extract_design_matrix};
use crate::dataset::split::{SplitError, SplitSummary, grouped_split};
use crate::ml::gbdt::{TrainDataset, TrainOptions, train_gbdt};
use crate::ml::metrics::{BinaryConfusion, log_loss};
use crate::ml::standardize::Standardizer;

/// Fraction of proteins routed to the test partition.
pub const TEST_FRACTION: f64 = 0.2;

/// Seed fixing the protein selection.
pub const SPLIT_SEED: u64 = 27;

/// Inputs for one training run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Path to the input feature CSV.
    pub features_csv: PathBuf,
    /// Destination for the serialized trained classifier.
    pub output_model: PathBuf,
}

/// Errors surfaced by [`run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Error loading features CSV: {0}")]
    Load(#[from] TableLoadError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Standardization failed: {0}")]
    Standardize(String),
    #[error("Training failed: {0}")]
    Train(String),
    #[error("Failed to save model to {path}: {message}")]
    Save { path: PathBuf, message: String },
}

/// Held-out metrics from a completed run, absent when the test partition
/// was empty.
#[derive(Debug, Clone)]
pub struct TestReport {
    pub confusion: BinaryConfusion,
    pub log_loss: f32,
}

/// Outcome of a completed training run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Group/row counts from the protein-aware split.
    pub split: SplitSummary,
    /// Metrics on the held-out partition.
    pub test: Option<TestReport>,
}

/// Execute the full training pipeline.
pub fn run(config: &TrainConfig) -> Result<PipelineReport, PipelineError> {
    let table = load_features_csv(&config.features_csv)?;
    info!(
        "loaded {} rows from {}",
        table.len(),
        config.features_csv.display()
    );

    let (train_table, test_table, summary) =
        grouped_split(&table, GROUP_COLUMN, TEST_FRACTION, Some(SPLIT_SEED))?;

    let mut train = extract_design_matrix(&train_table)?;
    let mut test = extract_design_matrix(&test_table)?;

    let scaler = Standardizer::fit(&train.x, FEATURE_COLUMNS.len())
        .map_err(PipelineError::Standardize)?;
    scaler.transform(&mut train.x);
    scaler.transform(&mut test.x);

    let options = TrainOptions::default();
    let dataset = TrainDataset {
        feature_len: FEATURE_COLUMNS.len(),
        x: train.x,
        y: train.y,
    };
    let model = train_gbdt(&dataset, &options).map_err(PipelineError::Train)?;
    info!("trained {} trees", model.trees.len());

    let report = if test.is_empty() {
        warn!("test partition is empty, skipping evaluation");
        None
    } else {
        let mut confusion = BinaryConfusion::default();
        let mut probs = Vec::with_capacity(test.len());
        for (row, &label) in test.x.iter().zip(test.y.iter()) {
            let p = model.predict_proba(row);
            probs.push(p);
            confusion.add(label > 0.5, p >= 0.5);
        }
        let loss = log_loss(&probs, &test.y);
        info!(
            "test accuracy: {:.4}  precision: {:.4}  recall: {:.4}  log loss: {:.4}",
            confusion.accuracy(),
            confusion.precision(),
            confusion.recall(),
            loss
        );
        Some(TestReport {
            confusion,
            log_loss: loss,
        })
    };

    model
        .save_binary(&config.output_model)
        .map_err(|message| PipelineError::Save {
            path: config.output_model.clone(),
            message,
        })?;
    info!("model saved to {}", config.output_model.display());

    Ok(PipelineReport {
        split: summary,
        test: report,
    })
}
