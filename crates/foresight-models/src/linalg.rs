//! Small dense solvers used by the regression steps.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{ModelError, Result};

/// Pivot magnitude below which a system is treated as singular.
const PIVOT_EPS: f64 = 1e-12;

/// Solve `A x = b` by Gaussian elimination with partial pivoting.
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    let mut m = a.clone();
    let mut rhs = b.clone();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))
            .unwrap_or(col);
        if m[[pivot, col]].abs() < PIVOT_EPS {
            return Err(ModelError::Singular(format!("zero pivot in column {}", col)));
        }
        if pivot != col {
            for k in 0..n {
                m.swap([col, k], [pivot, k]);
            }
            rhs.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = m[[row, col]] / m[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                m[[row, k]] -= factor * m[[col, k]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| m[[row, k]] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[[row, row]];
    }
    Ok(x)
}

/// Ridge least squares: `argmin ||y - X b||² + lambda ||b||²`.
///
/// `lambda` must be positive so constant or all-zero regressors stay solvable.
pub fn ridge(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, lambda: f64) -> Result<Array1<f64>> {
    if x.nrows() != y.len() {
        return Err(ModelError::DimensionMismatch {
            expected: x.nrows(),
            actual: y.len(),
        });
    }
    if lambda <= 0.0 {
        return Err(ModelError::InvalidParameter(format!(
            "ridge penalty must be positive, got {}",
            lambda
        )));
    }

    let mut gram = x.t().dot(&x);
    for i in 0..gram.nrows() {
        gram[[i, i]] += lambda;
    }
    let rhs = x.t().dot(&y);
    solve(&gram, &rhs)
}
