//! Protein-aware train/test splitting.
//!
//! Variants of one protein must never straddle the train/test boundary, so
//! the split is drawn over distinct protein identifiers rather than rows:
//! `floor(fraction * n_proteins)` identifiers are sampled without
//! replacement and every row follows its protein. Row counts therefore
//! track group sizes, not the requested fraction.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use thiserror::Error;
use tracing::{debug, info};

use super::loader::FeatureTable;

/// Errors returned by [`grouped_split`].
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("missing group column: {0}")]
    MissingGroupColumn(String),
    #[error("invalid test fraction {0} (expected a value in [0, 1])")]
    InvalidFraction(f64),
}

/// Group and row counts for a completed split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSummary {
    /// Distinct group values in the input.
    pub total_groups: usize,
    /// Groups routed to the train partition.
    pub train_groups: usize,
    /// Groups routed to the test partition.
    pub test_groups: usize,
    /// Rows routed to the train partition.
    pub train_rows: usize,
    /// Rows routed to the test partition.
    pub test_rows: usize,
}

/// Split `table` into `(train, test)` with whole groups on one side.
///
/// Distinct values of `group_column` are collected in sorted order, shuffled
/// with an explicitly constructed [`StdRng`] (seeded when `seed` is
/// supplied, OS-seeded otherwise), and the first `floor(test_fraction * n)`
/// become the test group set. A fraction of 0 yields an empty test
/// partition and 1 an empty train partition; neither is an error.
pub fn grouped_split(
    table: &FeatureTable,
    group_column: &str,
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<(FeatureTable, FeatureTable, SplitSummary), SplitError> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }
    let group_idx = table
        .column_index(group_column)
        .ok_or_else(|| SplitError::MissingGroupColumn(group_column.to_string()))?;

    // Sorted distinct groups keep the pre-shuffle order independent of row
    // order, so a fixed seed fixes the selection for a given input set.
    let mut groups: Vec<&str> = table
        .rows
        .iter()
        .map(|row| row[group_idx].as_str())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect();
    let n_test = (test_fraction * groups.len() as f64).floor() as usize;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    groups.shuffle(&mut rng);
    let test_groups: BTreeSet<&str> = groups.iter().take(n_test).copied().collect();

    let test = table.filtered(|row| test_groups.contains(row[group_idx].as_str()));
    let train = table.filtered(|row| !test_groups.contains(row[group_idx].as_str()));

    let summary = SplitSummary {
        total_groups: groups.len(),
        train_groups: groups.len() - n_test,
        test_groups: n_test,
        train_rows: train.len(),
        test_rows: test.len(),
    };
    info!("total proteins: {}", summary.total_groups);
    info!(
        "train proteins: {}, samples: {}",
        summary.train_groups, summary.train_rows
    );
    info!(
        "test proteins: {}, samples: {}",
        summary.test_groups, summary.test_rows
    );
    debug!("test protein set: {:?}", test_groups);

    Ok((train, test, summary))
}
