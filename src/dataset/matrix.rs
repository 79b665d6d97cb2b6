//! Extraction of the fixed feature/label columns into a dense matrix.

use thiserror::Error;

use super::loader::FeatureTable;

/// Column holding the protein identifier used for grouped splitting.
pub const GROUP_COLUMN: &str = "uniprotID";

/// Column holding the binary outcome label.
pub const LABEL_COLUMN: &str = "labels";

/// The nine model input columns, in the order the model consumes them.
pub const FEATURE_COLUMNS: [&str; 9] = [
    "Cα-Dist",
    "dRMS Local",
    "ΔSASA Normalized",
    "ΔCα-pLDDT",
    "MJ Potential Mutant",
    "Entropy",
    "PSSM Native",
    "Hydrophobicity",
    "substitutionMatrix",
];

/// Errors returned when extracting features and labels from a table.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("row {row}: invalid numeric value {value:?} in column {column}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
    #[error("row {row}: label must be 0 or 1, got {value:?}")]
    InvalidLabel { row: usize, value: String },
}

/// Dense design matrix: feature rows plus aligned binary labels.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Feature matrix, row-major, `FEATURE_COLUMNS.len()` values per row.
    pub x: Vec<Vec<f32>>,
    /// Labels aligned with `x`, each exactly 0.0 or 1.0.
    pub y: Vec<f32>,
}

impl DesignMatrix {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Select [`FEATURE_COLUMNS`] and [`LABEL_COLUMN`] from a table.
///
/// Fails on the first absent column, unparsable numeric cell, or label that
/// is not exactly 0 or 1. Row numbers in errors are 1-based data rows.
pub fn extract_design_matrix(table: &FeatureTable) -> Result<DesignMatrix, ExtractError> {
    let label_idx = table
        .column_index(LABEL_COLUMN)
        .ok_or_else(|| ExtractError::MissingColumn(LABEL_COLUMN.to_string()))?;
    let mut feature_indices = Vec::with_capacity(FEATURE_COLUMNS.len());
    for name in FEATURE_COLUMNS {
        let idx = table
            .column_index(name)
            .ok_or_else(|| ExtractError::MissingColumn(name.to_string()))?;
        feature_indices.push(idx);
    }

    let mut x = Vec::with_capacity(table.len());
    let mut y = Vec::with_capacity(table.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_idx + 1;
        let label_cell = row[label_idx].trim();
        let label: f32 = label_cell.parse().map_err(|_| ExtractError::InvalidLabel {
            row: row_num,
            value: label_cell.to_string(),
        })?;
        if label != 0.0 && label != 1.0 {
            return Err(ExtractError::InvalidLabel {
                row: row_num,
                value: label_cell.to_string(),
            });
        }

        let mut features = Vec::with_capacity(feature_indices.len());
        for (&cell_idx, &column) in feature_indices.iter().zip(FEATURE_COLUMNS.iter()) {
            let cell = row[cell_idx].trim();
            let value: f32 = cell.parse().map_err(|_| ExtractError::InvalidNumber {
                row: row_num,
                column: column.to_string(),
                value: cell.to_string(),
            })?;
            features.push(value);
        }
        x.push(features);
        y.push(label);
    }

    Ok(DesignMatrix { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(columns: &[&str], rows: &[&[&str]]) -> FeatureTable {
        FeatureTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn full_header() -> Vec<&'static str> {
        let mut columns = vec![GROUP_COLUMN, LABEL_COLUMN];
        columns.extend(FEATURE_COLUMNS);
        columns
    }

    #[test]
    fn extracts_features_in_declared_order() {
        let columns = full_header();
        let row: Vec<String> = ["P1", "1"]
            .into_iter()
            .map(String::from)
            .chain((0..9).map(|i| format!("{}.5", i)))
            .collect();
        let table = FeatureTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: vec![row],
        };

        let matrix = extract_design_matrix(&table).unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.y, vec![1.0]);
        assert_eq!(matrix.x[0][0], 0.5);
        assert_eq!(matrix.x[0][8], 8.5);
    }

    #[test]
    fn missing_feature_column_fails() {
        let table = table_with(&[GROUP_COLUMN, LABEL_COLUMN, "Entropy"], &[]);
        let err = extract_design_matrix(&table).unwrap_err();
        assert!(matches!(err, ExtractError::MissingColumn(name) if name == "Cα-Dist"));
    }

    #[test]
    fn missing_label_column_fails() {
        let table = table_with(&[GROUP_COLUMN], &[]);
        let err = extract_design_matrix(&table).unwrap_err();
        assert!(matches!(err, ExtractError::MissingColumn(name) if name == LABEL_COLUMN));
    }

    #[test]
    fn non_binary_label_fails() {
        let columns = full_header();
        let row: Vec<String> = ["P1", "2"]
            .into_iter()
            .map(String::from)
            .chain((0..9).map(|_| "0.0".to_string()))
            .collect();
        let table = FeatureTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: vec![row],
        };
        let err = extract_design_matrix(&table).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidLabel { row: 1, .. }));
    }

    #[test]
    fn malformed_numeric_cell_fails() {
        let columns = full_header();
        let mut cells: Vec<String> = ["P1", "0"].into_iter().map(String::from).collect();
        cells.extend((0..9).map(|_| "1.0".to_string()));
        cells[2] = "abc".to_string();
        let table = FeatureTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: vec![cells],
        };
        let err = extract_design_matrix(&table).unwrap_err();
        assert!(
            matches!(err, ExtractError::InvalidNumber { row: 1, column, .. } if column == "Cα-Dist")
        );
    }
}
