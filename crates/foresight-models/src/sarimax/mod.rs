//! Seasonal ARIMA with exogenous regressors.
//!
//! The model is
//!
//! ```text
//! φ(B) Φ(B^s) (1 - B)^d (1 - B^s)^D (y_t - x_t β) = θ(B) Θ(B^s) e_t
//! ```
//!
//! Regression coefficients `β` are estimated by ridge least squares on the
//! differenced data; the ARMA coefficients by conditional sum of squares,
//! minimised with Nelder-Mead.
//!
//! Fitting runs in tiers: the configured orders first, then a non-seasonal
//! `(1,1,1)` fallback. Forecasting tries the interval path, then the plain
//! point path, and finally substitutes the last in-sample fitted value when
//! every forecast value is non-finite.

mod css;
mod exog;
mod polynomial;

pub use exog::Exogenous;

use chrono::NaiveDate;
use foresight_features::TimeSeries;
use foresight_features::calendar::future_months;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info, warn};

use crate::error::{ModelError, Result};
use crate::forecast::{Forecast, ForecastInterval, ForecastPath};
use crate::linalg::ridge;
use crate::state::ModelState;
use css::LagStructure;

/// Ridge penalty for the regression step, relative to the Gram diagonal.
const RIDGE_PENALTY: f64 = 1e-8;

/// Non-seasonal `(p, d, q)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl Order {
    /// Create an order.
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal `(P, D, Q, s)` order. A period of 0 disables the seasonal part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order
    pub p: usize,
    /// Seasonal differencing order
    pub d: usize,
    /// Seasonal MA order
    pub q: usize,
    /// Season length in months
    pub period: usize,
}

impl SeasonalOrder {
    /// No seasonal component.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Create a seasonal order.
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    const fn differences(&self) -> usize {
        if self.period > 0 { self.d } else { 0 }
    }
}

/// SARIMAX configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SarimaxConfig {
    /// Non-seasonal order (default (1,1,1))
    pub order: Order,
    /// Seasonal order (default (1,1,1,12))
    pub seasonal_order: SeasonalOrder,
    /// Nelder-Mead iteration cap
    pub max_iterations: u64,
    /// Nelder-Mead termination tolerance on the simplex cost spread
    pub tolerance: f64,
    /// Nominal coverage of the forecast interval
    pub interval_level: f64,
}

impl Default for SarimaxConfig {
    fn default() -> Self {
        Self {
            order: Order::new(1, 1, 1),
            seasonal_order: SeasonalOrder::new(1, 1, 1, 12),
            max_iterations: 200,
            tolerance: 1e-8,
            interval_level: 0.95,
        }
    }
}

impl SarimaxConfig {
    /// The simplified configuration tried when the primary fit fails.
    pub fn fallback(&self) -> Self {
        Self {
            order: Order::new(1, 1, 1),
            seasonal_order: SeasonalOrder::NONE,
            ..self.clone()
        }
    }
}

/// Which configuration produced a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitTier {
    /// Configured orders
    Primary,
    /// Non-seasonal fallback orders
    Fallback,
}

/// Immutable snapshot of a fitted SARIMAX model.
#[derive(Debug, Clone)]
pub struct FittedSarimax {
    name: String,
    tier: FitTier,
    order: Order,
    seasonal_order: SeasonalOrder,
    params: Vec<f64>,
    beta: Vec<f64>,
    exog_names: Vec<String>,
    sigma2: f64,
    iterations: u64,
    history: Vec<f64>,
    history_exog: Option<Array2<f64>>,
    residuals: Vec<f64>,
    last_date: NaiveDate,
    last_fitted: Option<f64>,
}

impl FittedSarimax {
    /// Tier that produced this fit.
    pub const fn tier(&self) -> FitTier {
        self.tier
    }

    /// Non-seasonal order used.
    pub const fn order(&self) -> Order {
        self.order
    }

    /// Seasonal order used.
    pub const fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal_order
    }

    /// ARMA coefficients as `[φ.., Φ.., θ.., Θ..]`.
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    /// Regression coefficients, one per exogenous regressor.
    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    /// Names of the regressors the model was fitted with.
    pub fn exog_names(&self) -> &[String] {
        &self.exog_names
    }

    /// Innovation variance.
    pub const fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Optimiser iterations.
    pub const fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Forecast anchor: the last target date seen at fit time.
    pub const fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// In-sample fitted value at the last observation.
    pub const fn last_fitted(&self) -> Option<f64> {
        self.last_fitted
    }

    fn lags(&self) -> LagStructure {
        LagStructure::new(self.order, self.seasonal_order)
    }

    fn differencing(&self) -> Vec<f64> {
        polynomial::differencing(
            self.order.d,
            self.seasonal_order.differences(),
            self.seasonal_order.period,
        )
    }

    /// Point path for `horizon` steps.
    fn point_path(&self, horizon: usize, future_exog: Option<&Exogenous>) -> Result<Vec<f64>> {
        let delta = self.differencing();
        let lags = self.lags();
        let ar = lags.ar_poly(&self.params);
        let ma = lags.ma_poly(&self.params);

        // Regression component of the differenced future.
        let regression = match (&self.history_exog, future_exog) {
            (None, _) => vec![0.0; horizon],
            (Some(history), Some(future)) => {
                let mut out = vec![0.0; horizon];
                for (j, b) in self.beta.iter().enumerate() {
                    let mut full = history.column(j).to_vec();
                    full.extend(future.column(j));
                    let differenced = polynomial::apply(&delta, &full);
                    let tail = &differenced[differenced.len() - horizon..];
                    for (o, x) in out.iter_mut().zip(tail) {
                        *o += b * x;
                    }
                }
                out
            }
            (Some(_), None) => {
                return Err(ModelError::Forecast(
                    "model was fitted with exogenous regressors; future values required"
                        .to_string(),
                ));
            }
        };

        // ARMA recursion on w = z - Xβ with future innovations zero.
        let z = polynomial::apply(&delta, &self.history);
        let regression_history = self.regression_history(&delta);
        let mut w: Vec<f64> = z
            .iter()
            .zip(&regression_history)
            .map(|(z, r)| z - r)
            .collect();
        let mut e = self.residuals.clone();
        for _ in 0..horizon {
            let t = w.len();
            let ar_part: f64 = ar
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(i, _)| *i <= t)
                .map(|(i, c)| -c * w[t - i])
                .sum();
            let ma_part: f64 = ma
                .iter()
                .enumerate()
                .skip(1)
                .filter(|(j, _)| *j <= t)
                .map(|(j, c)| c * e[t - j])
                .sum();
            w.push(ar_part + ma_part);
            e.push(0.0);
        }

        let increments: Vec<f64> = w[w.len() - horizon..]
            .iter()
            .zip(&regression)
            .map(|(w, r)| w + r)
            .collect();
        Ok(polynomial::integrate(&delta, &self.history, &increments))
    }

    fn regression_history(&self, delta: &[f64]) -> Vec<f64> {
        let n = self.history.len().saturating_sub(delta.len() - 1);
        let mut out = vec![0.0; n];
        if let Some(history) = &self.history_exog {
            for (j, b) in self.beta.iter().enumerate() {
                let differenced = polynomial::apply(delta, &history.column(j).to_vec());
                for (o, x) in out.iter_mut().zip(&differenced) {
                    *o += b * x;
                }
            }
        }
        out
    }

    /// Symmetric band from the ψ-weights of the full differenced model.
    fn interval(&self, point: &[f64], level: f64) -> Result<ForecastInterval> {
        let lags = self.lags();
        let ar = polynomial::multiply(&lags.ar_poly(&self.params), &self.differencing());
        let ma = lags.ma_poly(&self.params);
        let psi = polynomial::psi_weights(&ar, &ma, point.len());

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ModelError::InvalidParameter(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + level / 2.0);

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(point.len());
        let mut upper = Vec::with_capacity(point.len());
        for (value, weight) in point.iter().zip(&psi) {
            cumulative += weight * weight;
            let half = z * (self.sigma2 * cumulative).sqrt();
            lower.push(value - half);
            upper.push(value + half);
        }
        if lower.iter().chain(&upper).any(|v| !v.is_finite()) {
            return Err(ModelError::Forecast("non-finite interval".to_string()));
        }
        Ok(ForecastInterval {
            level,
            lower,
            upper,
        })
    }
}

/// Seasonal ARIMA forecaster with optional exogenous regressors.
#[derive(Debug, Clone, Default)]
pub struct SeasonalForecaster {
    config: SarimaxConfig,
    state: ModelState<FittedSarimax>,
}

impl SeasonalForecaster {
    /// Create an unfitted forecaster.
    pub const fn new(config: SarimaxConfig) -> Self {
        Self {
            config,
            state: ModelState::Unfit,
        }
    }

    /// Configuration in use.
    pub const fn config(&self) -> &SarimaxConfig {
        &self.config
    }

    /// Fitted snapshot, if any.
    pub const fn fitted(&self) -> Result<&FittedSarimax> {
        self.state.fitted()
    }

    /// Whether the forecaster has been fitted.
    pub const fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }

    /// Fit to `target`, optionally with row-aligned exogenous regressors.
    ///
    /// Tries the configured orders first and the non-seasonal fallback on
    /// failure. A successful fit replaces any previous one.
    pub fn fit(&mut self, target: &TimeSeries, exog: Option<&Exogenous>) -> Result<&FittedSarimax> {
        let last_date = target.last_date().ok_or(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        if let Some(exog) = exog
            && exog.len() != target.len()
        {
            return Err(ModelError::DimensionMismatch {
                expected: target.len(),
                actual: exog.len(),
            });
        }

        if !target.is_contiguous() {
            warn!(
                series = target.name(),
                "target has missing months; observations are treated as consecutive"
            );
        }

        let snapshot = match fit_once(&self.config, FitTier::Primary, target, exog, last_date) {
            Ok(snapshot) => snapshot,
            Err(primary) => {
                warn!(
                    error = %primary,
                    "SARIMAX fit with configured orders failed, trying fallback"
                );
                let fallback = self.config.fallback();
                fit_once(&fallback, FitTier::Fallback, target, exog, last_date).map_err(|e| {
                    ModelError::Fit(format!(
                        "primary fit failed ({}); fallback fit failed ({})",
                        primary, e
                    ))
                })?
            }
        };

        info!(
            series = target.name(),
            tier = ?snapshot.tier,
            observations = target.len(),
            sigma2 = snapshot.sigma2,
            "SARIMAX fitted"
        );
        self.state.replace(snapshot)
    }

    /// Forecast `horizon` months after the fit anchor.
    ///
    /// `future_exog` must be supplied, with `horizon` rows, when the model
    /// was fitted with regressors.
    pub fn predict(&self, horizon: usize, future_exog: Option<&Exogenous>) -> Result<Forecast> {
        let fitted = self.state.fitted()?;
        let dates = future_months(fitted.last_date, horizon);
        if let Some(future) = future_exog {
            if future.len() != horizon {
                return Err(ModelError::DimensionMismatch {
                    expected: horizon,
                    actual: future.len(),
                });
            }
            if future.width() != fitted.beta.len() {
                return Err(ModelError::DimensionMismatch {
                    expected: fitted.beta.len(),
                    actual: future.width(),
                });
            }
            if future.names() != fitted.exog_names.as_slice() {
                return Err(ModelError::InvalidParameter(format!(
                    "future regressors {:?} do not match fitted regressors {:?}",
                    future.names(),
                    fitted.exog_names
                )));
            }
        }
        if horizon == 0 {
            return Ok(Forecast::new(fitted.name.clone(), dates, Vec::new(), ForecastPath::Point));
        }

        let point = fitted.point_path(horizon, future_exog)?;
        let interval = fitted.interval(&point, self.config.interval_level);
        select_path(&fitted.name, dates, point, interval, fitted.last_fitted)
    }
}

/// Pick the forecast tier: the interval forecast when both the band and the
/// point path are finite, the bare point path otherwise, and a flat line at
/// `last_fitted` when no point value is finite.
fn select_path(
    name: &str,
    dates: Vec<NaiveDate>,
    point: Vec<f64>,
    interval: Result<ForecastInterval>,
    last_fitted: Option<f64>,
) -> Result<Forecast> {
    let interval = interval.and_then(|interval| {
        if point.iter().all(|v| v.is_finite()) {
            Ok(interval)
        } else {
            Err(ModelError::Forecast("non-finite point path".to_string()))
        }
    });
    let (path, interval) = match interval {
        Ok(interval) => (ForecastPath::Interval, Some(interval)),
        Err(e) => {
            warn!(error = %e, "interval forecast unavailable, using point forecast");
            (ForecastPath::Point, None)
        }
    };

    if point.iter().all(|v| !v.is_finite()) {
        let last = last_fitted.ok_or_else(|| {
            ModelError::Forecast("forecast is empty and no fitted value exists".to_string())
        })?;
        warn!(value = last, "forecast is all missing, holding last fitted value");
        let horizon = dates.len();
        return Ok(Forecast::new(
            name,
            dates,
            vec![last; horizon],
            ForecastPath::LastFittedValue,
        ));
    }

    debug!(horizon = point.len(), path = ?path, "SARIMAX forecast produced");
    let forecast = Forecast::new(name, dates, point, path);
    Ok(match interval {
        Some(interval) => forecast.with_interval(interval),
        None => forecast,
    })
}

fn fit_once(
    config: &SarimaxConfig,
    tier: FitTier,
    target: &TimeSeries,
    exog: Option<&Exogenous>,
    last_date: NaiveDate,
) -> Result<FittedSarimax> {
    let y = target.values();
    let delta = polynomial::differencing(
        config.order.d,
        config.seasonal_order.differences(),
        config.seasonal_order.period,
    );
    let z = polynomial::apply(&delta, y);
    if z.is_empty() {
        return Err(ModelError::InsufficientData {
            required: delta.len(),
            actual: y.len(),
        });
    }

    let (beta, w) = match exog {
        Some(exog) if exog.width() > 0 => {
            let mut design = Array2::zeros((z.len(), exog.width()));
            for j in 0..exog.width() {
                let differenced = polynomial::apply(&delta, &exog.column(j));
                for (i, x) in differenced.into_iter().enumerate() {
                    design[[i, j]] = x;
                }
            }
            let gram_scale = design
                .columns()
                .into_iter()
                .map(|c| c.dot(&c))
                .fold(1.0_f64, f64::max);
            let zv = Array1::from(z.clone());
            let beta = ridge(design.view(), zv.view(), RIDGE_PENALTY * gram_scale)?;
            let w = (&zv - &design.dot(&beta)).to_vec();
            (beta.to_vec(), w)
        }
        _ => (Vec::new(), z),
    };

    let lags = LagStructure::new(config.order, config.seasonal_order);
    let estimate = css::estimate(&w, lags, config.max_iterations, config.tolerance)?;

    let last_fitted = estimate
        .residuals
        .last()
        .zip(y.last())
        .map(|(e, y)| y - e)
        .filter(|v| v.is_finite());

    debug!(
        ?tier,
        params = ?estimate.params,
        beta = ?beta,
        iterations = estimate.iterations,
        "SARIMAX estimate"
    );

    Ok(FittedSarimax {
        name: target.name().to_string(),
        tier,
        order: config.order,
        seasonal_order: config.seasonal_order,
        params: estimate.params,
        beta,
        exog_names: exog.map(|e| e.names().to_vec()).unwrap_or_default(),
        sigma2: estimate.sigma2,
        iterations: estimate.iterations,
        history: y.to_vec(),
        history_exog: exog.filter(|e| e.width() > 0).map(|e| e.values().clone()),
        residuals: estimate.residuals,
        last_date,
        last_fitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use foresight_features::calendar::add_months;

    fn series(n: u32, f: impl Fn(u32) -> f64) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2018, 1, 31).unwrap();
        TimeSeries::new("zhvi", (0..n).map(|i| (add_months(start, i), f(i)))).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = SarimaxConfig::default();
        assert_eq!(config.order, Order::new(1, 1, 1));
        assert_eq!(config.seasonal_order, SeasonalOrder::new(1, 1, 1, 12));

        let fallback = config.fallback();
        assert_eq!(fallback.order, Order::new(1, 1, 1));
        assert_eq!(fallback.seasonal_order, SeasonalOrder::NONE);
    }

    #[test]
    fn test_linear_trend_continues() {
        let y = series(48, |i| 100.0 + 2.0 * f64::from(i));
        let mut model = SeasonalForecaster::new(SarimaxConfig {
            order: Order::new(0, 2, 0),
            seasonal_order: SeasonalOrder::NONE,
            ..SarimaxConfig::default()
        });
        model.fit(&y, None).unwrap();
        let forecast = model.predict(3, None).unwrap();

        for (k, value) in forecast.values().iter().enumerate() {
            assert_abs_diff_eq!(*value, 194.0 + 2.0 * (k as f64 + 1.0), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_exog_required_at_predict() {
        let y = series(40, |i| 100.0 + f64::from(i % 5));
        let x = Exogenous::new(
            vec!["rate".to_string()],
            Array2::from_shape_fn((40, 1), |(i, _)| (i % 3) as f64),
        )
        .unwrap();
        let mut model = SeasonalForecaster::default();
        model.fit(&y, Some(&x)).unwrap();

        assert!(matches!(model.predict(6, None), Err(ModelError::Forecast(_))));
        let future = x.hold_last(6).unwrap();
        assert_eq!(model.predict(6, Some(&future)).unwrap().len(), 6);
    }

    #[test]
    fn test_swapped_regressor_names_rejected() {
        let y = series(40, |i| 100.0 + f64::from(i % 5) + f64::from(i));
        let x = Exogenous::new(
            vec!["mortgage_rate".to_string(), "inventory".to_string()],
            Array2::from_shape_fn((40, 2), |(i, j)| ((i + j) % (3 + j)) as f64),
        )
        .unwrap();
        let mut model = SeasonalForecaster::default();
        model.fit(&y, Some(&x)).unwrap();

        let future = x.hold_last(3).unwrap();
        let swapped = Exogenous::new(
            vec!["inventory".to_string(), "mortgage_rate".to_string()],
            future.values().clone(),
        )
        .unwrap();
        assert!(matches!(
            model.predict(3, Some(&swapped)),
            Err(ModelError::InvalidParameter(_))
        ));
        assert_eq!(model.predict(3, Some(&future)).unwrap().len(), 3);
    }

    #[test]
    fn test_gapped_target_still_fits() {
        let start = NaiveDate::from_ymd_opt(2018, 1, 31).unwrap();
        let y = TimeSeries::new(
            "zhvi",
            (0..40_u32)
                .filter(|i| *i != 10)
                .map(|i| (add_months(start, i), 100.0 + f64::from(i))),
        )
        .unwrap();
        assert!(!y.is_contiguous());

        let mut model = SeasonalForecaster::default();
        model.fit(&y, None).unwrap();
        assert_eq!(model.predict(4, None).unwrap().len(), 4);
    }

    fn horizon_dates(n: usize) -> Vec<NaiveDate> {
        future_months(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), n)
    }

    fn band(n: usize) -> ForecastInterval {
        ForecastInterval {
            level: 0.95,
            lower: vec![0.0; n],
            upper: vec![2.0; n],
        }
    }

    #[test]
    fn test_select_path_interval() {
        let forecast =
            select_path("zhvi", horizon_dates(3), vec![1.0; 3], Ok(band(3)), Some(5.0)).unwrap();
        assert_eq!(forecast.path(), ForecastPath::Interval);
        assert!(forecast.interval().is_some());
    }

    #[test]
    fn test_select_path_point_when_interval_fails() {
        let forecast = select_path(
            "zhvi",
            horizon_dates(3),
            vec![1.0, 2.0, 3.0],
            Err(ModelError::Forecast("non-finite interval".to_string())),
            Some(5.0),
        )
        .unwrap();
        assert_eq!(forecast.path(), ForecastPath::Point);
        assert!(forecast.interval().is_none());
        assert_eq!(forecast.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_select_path_point_when_partially_missing() {
        let forecast = select_path(
            "zhvi",
            horizon_dates(2),
            vec![1.0, f64::NAN],
            Ok(band(2)),
            Some(5.0),
        )
        .unwrap();
        assert_eq!(forecast.path(), ForecastPath::Point);
        assert_eq!(forecast.len(), 2);
    }

    #[test]
    fn test_select_path_holds_last_fitted_value() {
        let dates = horizon_dates(4);
        let forecast = select_path(
            "zhvi",
            dates.clone(),
            vec![f64::NAN; 4],
            Ok(band(4)),
            Some(250_000.0),
        )
        .unwrap();
        assert_eq!(forecast.path(), ForecastPath::LastFittedValue);
        assert_eq!(forecast.dates(), dates.as_slice());
        assert_eq!(forecast.values(), &[250_000.0; 4]);
        assert!(forecast.interval().is_none());
    }

    #[test]
    fn test_select_path_without_fitted_value_fails() {
        let result = select_path("zhvi", horizon_dates(4), vec![f64::NAN; 4], Ok(band(4)), None);
        assert!(matches!(result, Err(ModelError::Forecast(_))));
    }

    #[test]
    fn test_interval_widens() {
        let y = series(60, |i| 100.0 + f64::from(i) + f64::from((i * 7) % 5));
        let mut model = SeasonalForecaster::default();
        model.fit(&y, None).unwrap();
        let forecast = model.predict(12, None).unwrap();

        if let Some(interval) = forecast.interval() {
            let widths: Vec<f64> = interval
                .upper
                .iter()
                .zip(&interval.lower)
                .map(|(u, l)| u - l)
                .collect();
            assert!(widths.windows(2).all(|w| w[1] >= w[0] - 1e-9));
        }
    }
}
