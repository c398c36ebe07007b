//! Monthly time series and the record of market series feeding a forecast.

use crate::calendar::{month_end, month_index, months_between};
use crate::error::{FeatureError, Result};
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// An ordered monthly series of `(date, value)` pairs.
///
/// Dates are normalised to month-end, strictly ascending and unique per
/// calendar month. Values are finite. Gaps between months are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesRecord", into = "SeriesRecord")]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// Serialized form of a [`TimeSeries`]; validated on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SeriesRecord {
    name: String,
    points: Vec<(NaiveDate, f64)>,
}

impl TryFrom<SeriesRecord> for TimeSeries {
    type Error = FeatureError;

    fn try_from(record: SeriesRecord) -> Result<Self> {
        Self::new(record.name, record.points)
    }
}

impl From<TimeSeries> for SeriesRecord {
    fn from(series: TimeSeries) -> Self {
        let points = series.iter().collect();
        Self {
            name: series.name,
            points,
        }
    }
}

impl TimeSeries {
    /// Build a series from points that are already in ascending month order.
    pub fn new(
        name: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let name = name.into();
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut values = Vec::new();

        for (date, value) in points {
            let date = month_end(date);
            if !value.is_finite() {
                return Err(FeatureError::InvalidSeries {
                    name,
                    reason: format!("non-finite value at {}", date),
                });
            }
            if let Some(&prev) = dates.last()
                && month_index(date) <= month_index(prev)
            {
                return Err(FeatureError::InvalidSeries {
                    name,
                    reason: format!("{} does not follow {}", date, prev),
                });
            }
            dates.push(date);
            values.push(value);
        }

        Ok(Self {
            name,
            dates,
            values,
        })
    }

    /// Build a series from points in any order; duplicate months are rejected.
    pub fn from_unsorted(
        name: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self> {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by_key(|(date, _)| *date);
        Self::new(name, points)
    }

    /// An empty series.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dates: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations.
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the series has no observations.
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Observation dates (month-end).
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// First observation date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Last observed value.
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Value observed in the month of `date`, if any.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        let key = month_index(date);
        self.dates
            .binary_search_by_key(&key, |d| month_index(*d))
            .ok()
            .map(|i| self.values[i])
    }

    /// Whether consecutive observations are exactly one month apart.
    pub fn is_contiguous(&self) -> bool {
        self.dates
            .windows(2)
            .all(|pair| months_between(pair[0], pair[1]) == 1)
    }

    /// The last `n` observations.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            name: self.name.clone(),
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }

    /// Period-over-period percentage change, in percent units.
    ///
    /// The first observation has no predecessor and is dropped, as are
    /// changes that are not finite (a zero predecessor).
    pub fn pct_change(&self) -> Self {
        let (dates, values) = self
            .dates
            .iter()
            .skip(1)
            .zip(self.values.windows(2))
            .filter_map(|(date, pair)| {
                let change = (pair[1] / pair[0] - 1.0) * 100.0;
                change.is_finite().then_some((*date, change))
            })
            .unzip();

        Self {
            name: format!("{}_pct", self.name),
            dates,
            values,
        }
    }
}

/// The market series the forecasting core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub enum SeriesKind {
    /// Home value index for the region (the forecast target)
    #[display("home_value")]
    HomeValue,
    /// 30-year fixed mortgage rate
    #[display("mortgage_rate")]
    MortgageRate,
    /// Housing inventory
    #[display("inventory")]
    Inventory,
    /// House price index
    #[display("hpi")]
    Hpi,
}

impl SeriesKind {
    /// Every kind, in frame column order.
    pub const ALL: [Self; 4] = [
        Self::HomeValue,
        Self::MortgageRate,
        Self::Inventory,
        Self::Hpi,
    ];

    /// Column name used in aligned and feature frames.
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::HomeValue => "home_value",
            Self::MortgageRate => "mortgage_rate",
            Self::Inventory => "inventory",
            Self::Hpi => "hpi",
        }
    }

    /// Whether lag features are derived from this series.
    pub const fn is_lagged(self) -> bool {
        !matches!(self, Self::Hpi)
    }
}

/// One optional slot per known series kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSeries {
    /// Target home value series
    pub home_value: Option<TimeSeries>,
    /// Mortgage rate regressor
    pub mortgage_rate: Option<TimeSeries>,
    /// Inventory regressor
    pub inventory: Option<TimeSeries>,
    /// House price index regressor
    pub hpi: Option<TimeSeries>,
}

impl MarketSeries {
    /// A record holding only the target series.
    pub fn new(home_value: TimeSeries) -> Self {
        Self {
            home_value: Some(home_value),
            ..Default::default()
        }
    }

    /// Attach a mortgage rate series.
    pub fn with_mortgage_rate(mut self, series: TimeSeries) -> Self {
        self.mortgage_rate = Some(series);
        self
    }

    /// Attach an inventory series.
    pub fn with_inventory(mut self, series: TimeSeries) -> Self {
        self.inventory = Some(series);
        self
    }

    /// Attach a house price index series.
    pub fn with_hpi(mut self, series: TimeSeries) -> Self {
        self.hpi = Some(series);
        self
    }

    /// The series stored for `kind`.
    pub const fn get(&self, kind: SeriesKind) -> Option<&TimeSeries> {
        match kind {
            SeriesKind::HomeValue => self.home_value.as_ref(),
            SeriesKind::MortgageRate => self.mortgage_rate.as_ref(),
            SeriesKind::Inventory => self.inventory.as_ref(),
            SeriesKind::Hpi => self.hpi.as_ref(),
        }
    }

    /// Present, non-empty series in [`SeriesKind::ALL`] order.
    pub fn present(&self) -> impl Iterator<Item = (SeriesKind, &TimeSeries)> + '_ {
        SeriesKind::ALL.into_iter().filter_map(|kind| {
            self.get(kind)
                .filter(|series| !series.is_empty())
                .map(|series| (kind, series))
        })
    }
}
