//! End-to-end forecast for one region.
//!
//! Loading is async because the home value table is downloaded; everything
//! after [`load_market_series`] is synchronous and works on in-memory series.

use crate::error::{PipelineError, Result};
use crate::report::ForecastReport;
use derive_more::Display;
use foresight_data::{
    HpiProvider, InventoryProvider, MortgageRateProvider, SeriesProvider, SqliteCache,
    ZillowProvider,
};
use foresight_features::calendar::future_months;
use foresight_features::{
    FeatureFrame, MONTH_COLUMN, MarketSeries, SeriesKind, TARGET_COLUMN, TimeSeries,
    align_series, build_features,
};
use foresight_models::{
    BoostingConfig, Exogenous, Forecast, ReturnsForecaster, SarimaxConfig, SeasonalForecaster,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Default forecast horizon in months.
pub const DEFAULT_HORIZON: usize = 60;

/// Regressors handed to the seasonal model when all of them are available.
pub const EXOGENOUS_COLUMNS: [&str; 2] = [
    SeriesKind::MortgageRate.column_name(),
    SeriesKind::Inventory.column_name(),
];

/// Forecasting strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Seasonal ARIMA with exogenous regressors
    #[default]
    #[display("sarimax")]
    Sarimax,
    /// Gradient-boosted trees on monthly percentage changes
    #[display("gradient-boosting")]
    GradientBoosting,
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "sarimax" | "arima" => Ok(Self::Sarimax),
            "gradient-boosting" | "boosting" | "xgboost" | "gbm" => Ok(Self::GradientBoosting),
            _ => Err(PipelineError::UnknownModel(s.to_string())),
        }
    }
}

/// Forecast settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Months to forecast
    pub horizon: usize,
    /// Strategy to run
    pub model: ModelKind,
    /// Seasonal model settings
    pub sarimax: SarimaxConfig,
    /// Returns model settings
    pub boosting: BoostingConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            model: ModelKind::default(),
            sarimax: SarimaxConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Default settings for `model`.
    pub fn for_model(model: ModelKind) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Same settings with a different horizon.
    pub const fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }
}

/// Load the home value series for `region` and every macro series.
pub async fn load_market_series(
    region: &str,
    cache: Option<&SqliteCache>,
    force_refresh: bool,
) -> Result<MarketSeries> {
    let home_value = ZillowProvider::new(cache)?
        .get_series(region, force_refresh)
        .await?;
    info!(region, points = home_value.len(), "loaded home values");

    let mortgage_rate = MortgageRateProvider::new(cache).get_series(force_refresh)?;
    let inventory = InventoryProvider::new(cache).get_series(force_refresh)?;
    let hpi = HpiProvider::new(cache).get_series(force_refresh)?;

    Ok(MarketSeries::new(home_value)
        .with_mortgage_rate(mortgage_rate)
        .with_inventory(inventory)
        .with_hpi(hpi))
}

/// Align, build features, fit the configured model and forecast.
pub fn run_forecast(
    region: &str,
    series: &MarketSeries,
    config: &ForecastConfig,
) -> Result<ForecastReport> {
    if config.horizon == 0 {
        return Err(PipelineError::InvalidHorizon(config.horizon));
    }

    let aligned = align_series(series);
    let features = build_features(&aligned)?;
    let target = features.target_series()?;
    if target.is_empty() {
        return Err(PipelineError::EmptyHistory(region.to_string()));
    }
    debug!(
        region,
        rows = features.len(),
        columns = features.width(),
        "features ready"
    );

    let forecast = match config.model {
        ModelKind::Sarimax => forecast_seasonal(&features, &target, config)?,
        ModelKind::GradientBoosting => forecast_returns(&features, &target, config)?,
    };
    info!(
        region,
        model = %config.model,
        months = forecast.len(),
        "forecast complete"
    );

    ForecastReport::new(region, config.model, &target, forecast)
}

fn forecast_seasonal(
    features: &FeatureFrame,
    target: &TimeSeries,
    config: &ForecastConfig,
) -> Result<Forecast> {
    let exog = if EXOGENOUS_COLUMNS
        .iter()
        .all(|name| features.column(name).is_some())
    {
        Some(Exogenous::from_frame(features, &EXOGENOUS_COLUMNS)?)
    } else {
        debug!("regressors unavailable, fitting without exogenous inputs");
        None
    };

    let mut model = SeasonalForecaster::new(config.sarimax.clone());
    model.fit(target, exog.as_ref())?;

    let future = exog
        .as_ref()
        .map(|exog| exog.hold_last(config.horizon))
        .transpose()?;
    Ok(model.predict(config.horizon, future.as_ref())?)
}

fn forecast_returns(
    features: &FeatureFrame,
    target: &TimeSeries,
    config: &ForecastConfig,
) -> Result<Forecast> {
    let training = features.without(&[TARGET_COLUMN, MONTH_COLUMN]);

    let mut model = ReturnsForecaster::new(config.boosting.clone());
    let last_date = model.fit(&training, target)?.last_date();

    let future = training.repeat_last(future_months(last_date, config.horizon));
    Ok(model.predict(&future, target.last_value())?)
}
