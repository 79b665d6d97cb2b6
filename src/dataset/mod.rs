//! Feature table loading, extraction, and protein-aware splitting.

pub mod loader;
pub mod matrix;
pub mod split;
