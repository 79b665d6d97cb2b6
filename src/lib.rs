//! Library exports for the SIESTA training pipeline.
/// Feature table loading, extraction, and protein-aware splitting.
pub mod dataset;
/// Logging setup for the CLI.
pub mod logging;
/// Model training and evaluation building blocks.
pub mod ml;
/// End-to-end training orchestration.
pub mod pipeline;
