//! Forecast summary for display and JSON export.

use crate::error::{PipelineError, Result};
use crate::pipeline::ModelKind;
use chrono::NaiveDate;
use foresight_features::TimeSeries;
use foresight_models::{Forecast, ForecastInterval, ForecastPath, ModelError};
use serde::Serialize;
use std::fmt;

/// Months of history kept in a report.
pub const HISTORY_MONTHS: usize = 24;

/// One dated value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportPoint {
    /// Month-end date
    pub date: NaiveDate,
    /// Home value
    pub value: f64,
}

impl From<(NaiveDate, f64)> for ReportPoint {
    fn from((date, value): (NaiveDate, f64)) -> Self {
        Self { date, value }
    }
}

/// Result of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    /// Region code as requested
    pub region: String,
    /// Model that produced the forecast
    pub model: ModelKind,
    /// Most recent observed values, oldest first
    pub history: Vec<ReportPoint>,
    /// Forecast values, one per future month
    pub forecast: Vec<ReportPoint>,
    /// How the forecast values were obtained
    pub path: ForecastPath,
    /// Prediction band, when the model produced one
    pub interval: Option<ForecastInterval>,
    /// Last observed value
    pub current_value: f64,
    /// Value at the end of the horizon
    pub final_value: f64,
    /// Change from current to final value, in percent
    pub percent_change: f64,
}

impl ForecastReport {
    /// Summarise `forecast` against the observed `history`.
    pub fn new(
        region: &str,
        model: ModelKind,
        history: &TimeSeries,
        forecast: Forecast,
    ) -> Result<Self> {
        let current_value = history
            .last_value()
            .ok_or_else(|| PipelineError::EmptyHistory(region.to_string()))?;
        let final_value = forecast
            .last_value()
            .ok_or_else(|| ModelError::Forecast("forecast has no values".to_string()))?;

        Ok(Self {
            region: region.to_string(),
            model,
            history: history
                .tail(HISTORY_MONTHS)
                .iter()
                .map(ReportPoint::from)
                .collect(),
            forecast: forecast.iter().map(ReportPoint::from).collect(),
            path: forecast.path(),
            interval: forecast.interval().cloned(),
            current_value,
            final_value,
            percent_change: (final_value / current_value - 1.0) * 100.0,
        })
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Forecast rows at yearly steps, plus the final month.
    pub fn milestones(&self) -> impl Iterator<Item = (usize, &ReportPoint)> + '_ {
        let last = self.forecast.len().saturating_sub(1);
        self.forecast
            .iter()
            .enumerate()
            .filter(move |(i, _)| (i + 1) % 12 == 0 || *i == last)
    }
}

fn path_label(path: ForecastPath) -> &'static str {
    match path {
        ForecastPath::Interval => "point forecast with interval",
        ForecastPath::Point => "point forecast",
        ForecastPath::LastFittedValue => "flat at last fitted value",
        ForecastPath::CompoundedReturns => "compounded monthly changes",
    }
}

impl fmt::Display for ForecastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "╔══════════════════════════════════════════════════════════════╗"
        )?;
        writeln!(
            f,
            "║{:^62}║",
            format!("HOME VALUE FORECAST: ZIP {}", self.region)
        )?;
        writeln!(
            f,
            "╚══════════════════════════════════════════════════════════════╝"
        )?;
        writeln!(f)?;
        writeln!(f, "  Model:           {}", self.model)?;
        writeln!(f, "  Method:          {}", path_label(self.path))?;
        writeln!(f, "  Horizon:         {} months", self.forecast.len())?;
        writeln!(f, "  Current value:   ${:>12.0}", self.current_value)?;
        writeln!(f, "  Final forecast:  ${:>12.0}", self.final_value)?;
        writeln!(f, "  Total change:    {:>+12.1}%", self.percent_change)?;
        writeln!(f)?;

        writeln!(f, "  Recent history")?;
        for point in self.history.iter().rev().take(6).rev() {
            writeln!(f, "    {}  ${:>12.0}", point.date, point.value)?;
        }
        writeln!(f)?;

        writeln!(f, "  Forecast")?;
        for (i, point) in self.milestones() {
            write!(f, "    {}  ${:>12.0}", point.date, point.value)?;
            if let Some(interval) = &self.interval
                && let (Some(lower), Some(upper)) = (interval.lower.get(i), interval.upper.get(i))
            {
                write!(
                    f,
                    "  [{:.0}% band ${:.0} to ${:.0}]",
                    interval.level * 100.0,
                    lower,
                    upper
                )?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use foresight_features::calendar::{add_months, future_months};

    fn history() -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        TimeSeries::new(
            "home_value",
            (0..36).map(|i| (add_months(start, i), 200_000.0 + 1_000.0 * f64::from(i))),
        )
        .unwrap()
    }

    fn forecast(history: &TimeSeries, horizon: usize) -> Forecast {
        let dates = future_months(history.last_date().unwrap(), horizon);
        let values = (1..=horizon).map(|i| 235_000.0 + 1_000.0 * i as f64).collect();
        Forecast::new("home_value", dates, values, ForecastPath::Point)
    }

    #[test]
    fn test_summary_values() {
        let history = history();
        let report =
            ForecastReport::new("08901", ModelKind::Sarimax, &history, forecast(&history, 24))
                .unwrap();

        assert_eq!(report.history.len(), HISTORY_MONTHS);
        assert_eq!(report.forecast.len(), 24);
        assert_relative_eq!(report.current_value, 235_000.0);
        assert_relative_eq!(report.final_value, 259_000.0);
        assert_relative_eq!(
            report.percent_change,
            (259_000.0 / 235_000.0 - 1.0) * 100.0
        );
    }

    #[test]
    fn test_milestones_are_yearly_plus_final() {
        let history = history();
        let report = ForecastReport::new(
            "08901",
            ModelKind::GradientBoosting,
            &history,
            forecast(&history, 30),
        )
        .unwrap();
        let steps: Vec<usize> = report.milestones().map(|(i, _)| i).collect();
        assert_eq!(steps, vec![11, 23, 29]);
    }

    #[test]
    fn test_empty_forecast_is_rejected() {
        let history = history();
        let empty = Forecast::new("home_value", Vec::new(), Vec::new(), ForecastPath::Point);
        assert!(ForecastReport::new("08901", ModelKind::Sarimax, &history, empty).is_err());
    }

    #[test]
    fn test_json_and_text_output() {
        let history = history();
        let report = ForecastReport::new(
            "08901",
            ModelKind::GradientBoosting,
            &history,
            forecast(&history, 12),
        )
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["model"], "gradient-boosting");
        assert_eq!(json["path"], "point");
        assert_eq!(json["forecast"].as_array().unwrap().len(), 12);

        let text = report.to_string();
        assert!(text.contains("ZIP 08901"));
        assert!(text.contains("gradient-boosting"));
    }
}
