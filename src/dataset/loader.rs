//! CSV loader for precomputed variant feature tables.

use std::path::Path;

use csv::ReaderBuilder;
use thiserror::Error;

/// Errors returned when loading a feature CSV.
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("empty header row")]
    EmptyHeader,
}

/// In-memory feature table: one header row plus string-valued records.
///
/// Values stay untyped until extraction so the loader does not need to know
/// which columns are numeric.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Row-major cell values aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl FeatureTable {
    /// Position of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Copy of this table containing only the rows selected by `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&[String]) -> bool) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row.as_slice()))
                .cloned()
                .collect(),
        }
    }
}

/// Load a headered CSV file into a [`FeatureTable`].
///
/// Ragged records are rejected by the reader, so every returned row has
/// exactly `columns.len()` cells.
pub fn load_features_csv(path: &Path) -> Result<FeatureTable, TableLoadError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() || columns.iter().all(|column| column.is_empty()) {
        return Err(TableLoadError::EmptyHeader);
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(FeatureTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_headered_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("features.csv");
        std::fs::write(&path, "uniprotID,labels,Entropy\nP1,0,0.5\nP2,1,0.7\n").unwrap();

        let table = load_features_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["uniprotID", "labels", "Entropy"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1], vec!["P2", "1", "0.7"]);
        assert_eq!(table.column_index("Entropy"), Some(2));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_features_csv(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(TableLoadError::Csv(_))));
    }

    #[test]
    fn ragged_record_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        assert!(load_features_csv(&path).is_err());
    }

    #[test]
    fn filtered_keeps_columns_and_selected_rows() {
        let table = FeatureTable {
            columns: vec!["id".to_string(), "v".to_string()],
            rows: vec![
                vec!["a".to_string(), "1".to_string()],
                vec!["b".to_string(), "2".to_string()],
            ],
        };
        let kept = table.filtered(|row| row[0] == "b");
        assert_eq!(kept.columns, table.columns);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.rows[0][1], "2");
    }
}
