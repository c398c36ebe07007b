//! Lag-polynomial arithmetic.
//!
//! A polynomial `c0 + c1 B + c2 B² + ...` in the backshift operator `B` is
//! stored as its coefficient vector `[c0, c1, c2, ...]`.

/// Product of two lag polynomials.
pub(crate) fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c1 B^step + c2 B^(2 step) + ...)`.
pub(crate) fn from_coefficients(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut out = vec![0.0; coefficients.len() * step + 1];
    out[0] = 1.0;
    for (k, c) in coefficients.iter().enumerate() {
        out[(k + 1) * step] = sign * c;
    }
    out
}

/// Differencing operator `(1 - B)^d (1 - B^s)^D`.
pub(crate) fn differencing(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut out = vec![1.0];
    for _ in 0..d {
        out = multiply(&out, &[1.0, -1.0]);
    }
    if period > 0 {
        for _ in 0..seasonal_d {
            out = multiply(&out, &from_coefficients(&[1.0], period, -1.0));
        }
    }
    out
}

/// Apply `poly` as a filter: `out[t] = Σ poly[i] x[t - i]`.
///
/// The first `poly.len() - 1` observations are consumed as initial
/// conditions, so the output is that much shorter than the input.
pub(crate) fn apply(poly: &[f64], x: &[f64]) -> Vec<f64> {
    let lags = poly.len().saturating_sub(1);
    if x.len() <= lags {
        return Vec::new();
    }
    (lags..x.len())
        .map(|t| poly.iter().enumerate().map(|(i, c)| c * x[t - i]).sum())
        .collect()
}

/// Extend `history` by inverting `poly` over `increments`:
/// `y[t] = z[t] - Σ_{i≥1} poly[i] y[t - i]`.
///
/// Returns only the new values. `history` must hold at least
/// `poly.len() - 1` observations.
pub(crate) fn integrate(poly: &[f64], history: &[f64], increments: &[f64]) -> Vec<f64> {
    let mut levels = history.to_vec();
    for z in increments {
        let t = levels.len();
        let carry: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * levels[t - i])
            .sum();
        levels.push(z - carry);
    }
    levels.split_off(history.len())
}

/// MA(∞) weights `ψ` of `ma(B) / ar(B)`, both with leading coefficient 1.
pub(crate) fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = if j == 0 {
            1.0
        } else {
            ma.get(j).copied().unwrap_or(0.0)
        };
        for i in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_multiply() {
        // (1 - B)(1 + B) = 1 - B²
        assert_eq!(multiply(&[1.0, -1.0], &[1.0, 1.0]), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn test_seasonal_differencing_shape() {
        let poly = differencing(1, 1, 12);
        assert_eq!(poly.len(), 14);
        assert_eq!(poly[0], 1.0);
        assert_eq!(poly[1], -1.0);
        assert_eq!(poly[12], -1.0);
        assert_eq!(poly[13], 1.0);
    }

    #[test]
    fn test_apply_then_integrate_recovers_levels() {
        let poly = differencing(1, 1, 4);
        let y: Vec<f64> = (0..20_i32).map(|t| f64::from(t * t) + f64::from(t % 4)).collect();
        let lags = poly.len() - 1;
        let z = apply(&poly, &y);
        assert_eq!(z.len(), y.len() - lags);

        let rebuilt = integrate(&poly, &y[..lags], &z);
        for (a, b) in rebuilt.iter().zip(&y[lags..]) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_psi_weights_ar1() {
        // (1 - 0.5B) y = e  =>  ψ_j = 0.5^j
        let psi = psi_weights(&[1.0, -0.5], &[1.0], 5);
        for (j, p) in psi.iter().enumerate() {
            assert_abs_diff_eq!(*p, 0.5_f64.powi(j as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_random_walk_psi_is_flat() {
        let psi = psi_weights(&differencing(1, 0, 0), &[1.0], 4);
        assert_eq!(psi, vec![1.0; 4]);
    }
}
