//! Per-feature standardization fitted on training data only.

/// Affine per-column transform: subtract mean, divide by standard deviation.
///
/// Fitting and application are separate so the transform fitted on the
/// train partition can be applied unchanged to the test partition; test
/// rows never contribute to the statistics. A column whose standard
/// deviation underflows the `1e-6` clamp standardizes to constant zero,
/// matching the behavior of the original preprocessing.
#[derive(Debug, Clone)]
pub struct Standardizer {
    /// Per-column means from the fitting data.
    pub mean: Vec<f32>,
    /// Per-column standard deviations from the fitting data.
    pub std: Vec<f32>,
}

impl Standardizer {
    /// Fit column statistics on `rows`, each of length `feature_len`.
    pub fn fit(rows: &[Vec<f32>], feature_len: usize) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("Cannot fit standardizer on an empty partition".to_string());
        }
        for row in rows {
            if row.len() != feature_len {
                return Err(format!(
                    "Inconsistent feature row length {} (expected {feature_len})",
                    row.len()
                ));
            }
        }
        let n = rows.len() as f32;
        let mut mean = vec![0.0f32; feature_len];
        for row in rows {
            for (i, &value) in row.iter().enumerate() {
                mean[i] += value;
            }
        }
        for value in &mut mean {
            *value /= n;
        }
        let mut variance = vec![0.0f32; feature_len];
        for row in rows {
            for (i, &value) in row.iter().enumerate() {
                let diff = value - mean[i];
                variance[i] += diff * diff;
            }
        }
        let std = variance.into_iter().map(|v| (v / n).sqrt()).collect();
        Ok(Self { mean, std })
    }

    /// Apply the fitted transform to `rows` in place.
    pub fn transform(&self, rows: &mut [Vec<f32>]) {
        for row in rows {
            for (i, value) in row.iter_mut().enumerate() {
                let denom = self.std.get(i).copied().unwrap_or(1.0).max(1e-6);
                let mean = self.mean.get(i).copied().unwrap_or(0.0);
                *value = (*value - mean) / denom;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_uses_population_statistics() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = Standardizer::fit(&rows, 2).unwrap();
        assert_eq!(scaler.mean, vec![2.0, 10.0]);
        assert_eq!(scaler.std[0], 1.0);
        assert_eq!(scaler.std[1], 0.0);
    }

    #[test]
    fn transform_centers_and_scales() {
        let rows = vec![vec![1.0], vec![3.0]];
        let scaler = Standardizer::fit(&rows, 1).unwrap();
        let mut transformed = rows.clone();
        scaler.transform(&mut transformed);
        assert_eq!(transformed, vec![vec![-1.0], vec![1.0]]);
    }

    #[test]
    fn zero_variance_column_becomes_constant_zero() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let scaler = Standardizer::fit(&rows, 1).unwrap();
        let mut transformed = rows.clone();
        scaler.transform(&mut transformed);
        assert_eq!(transformed, vec![vec![0.0], vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_rows_use_train_statistics_only() {
        let train = vec![vec![0.0], vec![2.0]];
        let scaler = Standardizer::fit(&train, 1).unwrap();

        // The same held-out value standardizes identically no matter how
        // many other rows surround it.
        let mut lone = vec![vec![4.0]];
        let mut batch = vec![vec![4.0], vec![-100.0], vec![100.0]];
        scaler.transform(&mut lone);
        scaler.transform(&mut batch);
        assert_eq!(lone[0][0], batch[0][0]);
        assert_eq!(lone[0][0], 3.0);
    }

    #[test]
    fn empty_fit_is_an_error() {
        assert!(Standardizer::fit(&[], 3).is_err());
    }
}
