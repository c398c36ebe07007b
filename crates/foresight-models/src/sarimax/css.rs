//! Conditional-sum-of-squares estimation of the ARMA part.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State};
use argmin::solver::neldermead::NelderMead;
use tracing::debug;

use super::polynomial::{from_coefficients, multiply};
use super::{Order, SeasonalOrder};
use crate::error::{ModelError, Result};

/// Cost returned for parameters outside the admissible region.
const PENALTY: f64 = 1e12;

/// Bound on `Σ|c|` for each coefficient block.
const ADMISSIBLE_BOUND: f64 = 0.999;

/// Initial simplex edge length.
const SIMPLEX_STEP: f64 = 0.1;

/// Layout of the ARMA parameter vector: `[φ.., Φ.., θ.., Θ..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LagStructure {
    p: usize,
    q: usize,
    seasonal_p: usize,
    seasonal_q: usize,
    period: usize,
}

/// Parameter vector split into its four blocks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Blocks<'a> {
    pub(crate) ar: &'a [f64],
    pub(crate) seasonal_ar: &'a [f64],
    pub(crate) ma: &'a [f64],
    pub(crate) seasonal_ma: &'a [f64],
}

impl LagStructure {
    pub(crate) const fn new(order: Order, seasonal: SeasonalOrder) -> Self {
        let (seasonal_p, seasonal_q) = if seasonal.period > 0 {
            (seasonal.p, seasonal.q)
        } else {
            (0, 0)
        };
        Self {
            p: order.p,
            q: order.q,
            seasonal_p,
            seasonal_q,
            period: seasonal.period,
        }
    }

    pub(crate) const fn n_params(&self) -> usize {
        self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    /// Number of leading observations consumed by the AR recursion.
    pub(crate) const fn ar_lags(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    pub(crate) fn split<'a>(&self, params: &'a [f64]) -> Blocks<'a> {
        let (ar, rest) = params.split_at(self.p);
        let (seasonal_ar, rest) = rest.split_at(self.seasonal_p);
        let (ma, seasonal_ma) = rest.split_at(self.q);
        Blocks {
            ar,
            seasonal_ar,
            ma,
            seasonal_ma,
        }
    }

    /// `φ(B) Φ(B^s)` with the sign convention `1 - φ1 B - ...`.
    pub(crate) fn ar_poly(&self, params: &[f64]) -> Vec<f64> {
        let blocks = self.split(params);
        multiply(
            &from_coefficients(blocks.ar, 1, -1.0),
            &from_coefficients(blocks.seasonal_ar, self.period.max(1), -1.0),
        )
    }

    /// `θ(B) Θ(B^s)` with the sign convention `1 + θ1 B + ...`.
    pub(crate) fn ma_poly(&self, params: &[f64]) -> Vec<f64> {
        let blocks = self.split(params);
        multiply(
            &from_coefficients(blocks.ma, 1, 1.0),
            &from_coefficients(blocks.seasonal_ma, self.period.max(1), 1.0),
        )
    }

    /// How far the parameters sit outside the region `Σ|c| < 1` per block.
    fn excess(&self, params: &[f64]) -> f64 {
        let blocks = self.split(params);
        [blocks.ar, blocks.seasonal_ar, blocks.ma, blocks.seasonal_ma]
            .iter()
            .map(|block| {
                let total: f64 = block.iter().map(|c| c.abs()).sum();
                (total - ADMISSIBLE_BOUND).max(0.0)
            })
            .sum()
    }
}

/// One-step residuals of `ar(B) w = ma(B) e`, with pre-sample residuals zero.
///
/// The first `ar.len() - 1` entries are conditioning values and are zero.
pub(crate) fn residuals(ar: &[f64], ma: &[f64], w: &[f64]) -> Vec<f64> {
    let start = ar.len().saturating_sub(1);
    let mut e = vec![0.0; w.len()];
    for t in start..w.len() {
        let ar_part: f64 = ar.iter().enumerate().map(|(i, c)| c * w[t - i]).sum();
        let ma_part: f64 = ma
            .iter()
            .enumerate()
            .skip(1)
            .take_while(|(j, _)| *j <= t)
            .map(|(j, c)| c * e[t - j])
            .sum();
        e[t] = ar_part - ma_part;
    }
    e
}

/// Result of a CSS fit.
#[derive(Debug, Clone)]
pub(crate) struct CssEstimate {
    pub(crate) params: Vec<f64>,
    pub(crate) residuals: Vec<f64>,
    pub(crate) sigma2: f64,
    pub(crate) iterations: u64,
}

struct CssProblem {
    w: Vec<f64>,
    lags: LagStructure,
}

impl CostFunction for CssProblem {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, ArgminError> {
        let excess = self.lags.excess(param);
        if excess > 0.0 {
            return Ok(PENALTY * (1.0 + excess));
        }
        let e = residuals(&self.lags.ar_poly(param), &self.lags.ma_poly(param), &self.w);
        let sse: f64 = e[self.lags.ar_lags()..].iter().map(|v| v * v).sum();
        Ok(if sse.is_finite() { sse } else { PENALTY })
    }
}

/// Estimate ARMA coefficients for the stationary series `w`.
pub(crate) fn estimate(
    w: &[f64],
    lags: LagStructure,
    max_iterations: u64,
    tolerance: f64,
) -> Result<CssEstimate> {
    let n_params = lags.n_params();
    let effective = w.len().saturating_sub(lags.ar_lags());
    if effective <= n_params + 1 {
        return Err(ModelError::InsufficientData {
            required: lags.ar_lags() + n_params + 2,
            actual: w.len(),
        });
    }

    // Optimise on a unit-variance copy so the penalty dominates any feasible cost.
    let scale = {
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / w.len() as f64;
        let std = var.sqrt();
        if std > 0.0 && std.is_finite() { std } else { 1.0 }
    };

    let (params, iterations) = if n_params == 0 {
        (Vec::new(), 0)
    } else {
        let problem = CssProblem {
            w: w.iter().map(|v| v / scale).collect(),
            lags,
        };
        let origin = vec![0.0; n_params];
        let mut simplex = vec![origin.clone()];
        for k in 0..n_params {
            let mut vertex = origin.clone();
            vertex[k] = SIMPLEX_STEP;
            simplex.push(vertex);
        }
        let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(simplex)
            .with_sd_tolerance(tolerance)
            .map_err(|e| ModelError::Fit(e.to_string()))?;
        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(max_iterations))
            .run()
            .map_err(|e| ModelError::Fit(format!("optimiser failed: {}", e)))?;

        let best = result
            .state
            .get_best_param()
            .cloned()
            .ok_or_else(|| ModelError::Fit("optimiser returned no parameters".to_string()))?;
        debug!(
            iterations = result.state.get_iter(),
            cost = result.state.get_best_cost(),
            "CSS optimisation finished"
        );
        (best, result.state.get_iter())
    };

    if lags.excess(&params) > 0.0 {
        return Err(ModelError::Fit(
            "no admissible ARMA coefficients found".to_string(),
        ));
    }

    let e = residuals(&lags.ar_poly(&params), &lags.ma_poly(&params), w);
    let sse: f64 = e[lags.ar_lags()..].iter().map(|v| v * v).sum();
    let sigma2 = sse / effective as f64;
    if !sigma2.is_finite() {
        return Err(ModelError::Fit("non-finite residual variance".to_string()));
    }

    Ok(CssEstimate {
        params,
        residuals: e,
        sigma2,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn ar1(phi: f64, n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut w = vec![0.0; n];
        for t in 1..n {
            w[t] = phi * w[t - 1] + rng.gen_range(-1.0..1.0);
        }
        w
    }

    #[test]
    fn test_split_layout() {
        let lags = LagStructure::new(Order::new(2, 1, 1), SeasonalOrder::new(1, 1, 1, 12));
        let params = [0.1, 0.2, 0.3, 0.4, 0.5];
        let blocks = lags.split(&params);

        assert_eq!(lags.n_params(), 5);
        assert_eq!(lags.ar_lags(), 14);
        assert_eq!(blocks.ar, &[0.1, 0.2]);
        assert_eq!(blocks.seasonal_ar, &[0.3]);
        assert_eq!(blocks.ma, &[0.4]);
        assert_eq!(blocks.seasonal_ma, &[0.5]);
    }

    #[test]
    fn test_seasonal_ar_poly_is_product() {
        let lags = LagStructure::new(Order::new(1, 0, 0), SeasonalOrder::new(1, 0, 0, 4));
        let poly = lags.ar_poly(&[0.5, 0.2]);
        // (1 - 0.5B)(1 - 0.2B⁴)
        assert_eq!(poly.len(), 6);
        assert_abs_diff_eq!(poly[1], -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(poly[4], -0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(poly[5], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_recovers_ar1_coefficient() {
        let lags = LagStructure::new(Order::new(1, 0, 0), SeasonalOrder::NONE);
        let fit = estimate(&ar1(0.6, 400), lags, 500, 1e-10).unwrap();

        assert_abs_diff_eq!(fit.params[0], 0.6, epsilon = 0.1);
        assert!(fit.sigma2 > 0.0);
    }

    #[test]
    fn test_too_short() {
        let lags = LagStructure::new(Order::new(1, 0, 1), SeasonalOrder::new(1, 0, 1, 12));
        assert!(matches!(
            estimate(&[0.0; 10], lags, 100, 1e-8),
            Err(ModelError::InsufficientData { .. })
        ));
    }
}
