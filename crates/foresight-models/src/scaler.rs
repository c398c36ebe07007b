//! Per-column standardisation.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Zero-mean, unit-variance scaler fitted on training rows only.
///
/// Uses the population standard deviation. Columns with zero variance keep
/// a scale of 1 so they pass through centred but unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `x`.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        let mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x.std_axis(Axis(0), 0.0).mapv(|s| {
            if s > 0.0 && s.is_finite() {
                s
            } else {
                1.0
            }
        });
        Ok(Self { mean, scale })
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Column means.
    pub const fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Column scales.
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Apply the fitted transform.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_standardises_columns() {
        let x = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        assert_abs_diff_eq!(z.column(0).mean().unwrap(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z.column(0).std(0.0), 1.0, epsilon = 1e-12);
        // Constant column keeps scale 1.
        assert_eq!(scaler.scale()[1], 1.0);
        assert!(z.column(1).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_transform_uses_training_statistics() {
        let scaler = StandardScaler::fit(&array![[0.0], [2.0]]).unwrap();
        let z = scaler.transform(&array![[4.0]]).unwrap();
        assert_abs_diff_eq!(z[[0, 0]], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::fit(&array![[0.0, 1.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[0.0]]),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }
}
