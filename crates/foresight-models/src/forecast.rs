//! Forecast output shared by every forecaster.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which tier produced a forecast's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastPath {
    /// Point path taken from a forecast with uncertainty
    Interval,
    /// Plain point forecast
    Point,
    /// Flat line at the last in-sample fitted value
    LastFittedValue,
    /// Levels compounded from predicted percentage changes
    CompoundedReturns,
}

/// Symmetric prediction band around a point path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    /// Nominal coverage, e.g. 0.95
    pub level: f64,
    /// Lower bound per horizon step
    pub lower: Vec<f64>,
    /// Upper bound per horizon step
    pub upper: Vec<f64>,
}

/// A forecast: one value per future month-end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    path: ForecastPath,
    interval: Option<ForecastInterval>,
}

impl Forecast {
    /// Create a forecast. `dates` and `values` must have equal length.
    pub fn new(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        values: Vec<f64>,
        path: ForecastPath,
    ) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self {
            name: name.into(),
            dates,
            values,
            path,
            interval: None,
        }
    }

    /// Attach a prediction interval.
    pub fn with_interval(mut self, interval: ForecastInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Forecast name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forecast dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Forecast values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Tier that produced the values.
    pub const fn path(&self) -> ForecastPath {
        self.path
    }

    /// Prediction interval, when the interval tier ran.
    pub const fn interval(&self) -> Option<&ForecastInterval> {
        self.interval.as_ref()
    }

    /// Number of forecast steps.
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the forecast is empty.
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Final forecast value.
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}
