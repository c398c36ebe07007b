//! Regression-on-returns forecaster.
//!
//! Learns monthly percentage changes of the target from a feature frame with
//! a gradient-boosted tree ensemble, then rebuilds levels by compounding the
//! predicted changes from an anchor level.
//!
//! Each step compounds off the previous *predicted* level, never an observed
//! one, so errors accumulate multiplicatively across the horizon.

use std::collections::HashMap;

use chrono::NaiveDate;
use foresight_features::{FeatureFrame, TimeSeries};
use ndarray::Array2;
use tracing::{debug, info};

use crate::boosting::{BoostingConfig, GradientBoostingRegressor};
use crate::error::{ModelError, Result};
use crate::forecast::{Forecast, ForecastPath};
use crate::scaler::StandardScaler;
use crate::state::ModelState;

/// Immutable snapshot of a fitted returns model.
#[derive(Debug, Clone)]
pub struct FittedReturns {
    name: String,
    feature_columns: Vec<String>,
    scaler: StandardScaler,
    model: GradientBoostingRegressor,
    last_value: f64,
    last_date: NaiveDate,
    training_rows: usize,
}

impl FittedReturns {
    /// Retained feature columns, in training order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Final level of the training target, the default compounding anchor.
    pub const fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Final date of the training target.
    pub const fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    /// Rows that survived alignment and missing-value filtering.
    pub const fn training_rows(&self) -> usize {
        self.training_rows
    }

    /// Scaler fitted on the training rows.
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

/// Forecaster over percentage changes with level reconstruction.
#[derive(Debug, Clone, Default)]
pub struct ReturnsForecaster {
    config: BoostingConfig,
    state: ModelState<FittedReturns>,
}

impl ReturnsForecaster {
    /// Create an unfitted forecaster.
    pub const fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            state: ModelState::Unfit,
        }
    }

    /// Fitted snapshot, if any.
    pub const fn fitted(&self) -> Result<&FittedReturns> {
        self.state.fitted()
    }

    /// Whether the forecaster has been fitted.
    pub const fn is_fitted(&self) -> bool {
        self.state.is_fitted()
    }

    /// Fit on `features` against the percentage changes of `target`.
    ///
    /// Only numeric columns are used. Rows are restricted to dates present
    /// in both inputs, then any row with a missing feature is dropped.
    pub fn fit(&mut self, features: &FeatureFrame, target: &TimeSeries) -> Result<&FittedReturns> {
        let (last_date, last_value) = target
            .last_date()
            .zip(target.last_value())
            .ok_or(ModelError::InsufficientData {
                required: 2,
                actual: target.len(),
            })?;

        let changes: HashMap<NaiveDate, f64> = target.pct_change().iter().collect();
        let columns: Vec<_> = features.numeric_columns().collect();
        let feature_columns: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

        let mut rows = Vec::new();
        let mut y = Vec::new();
        for (i, date) in features.index().iter().enumerate() {
            let Some(change) = changes.get(date) else {
                continue;
            };
            let row: Option<Vec<f64>> = columns
                .iter()
                .map(|c| c.values()[i].filter(|v| v.is_finite()))
                .collect();
            if let Some(row) = row {
                rows.extend(row);
                y.push(*change);
            }
        }
        if y.is_empty() {
            return Err(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let x = Array2::from_shape_vec((y.len(), feature_columns.len()), rows)
            .map_err(|e| ModelError::Fit(e.to_string()))?;
        let scaler = StandardScaler::fit(&x)?;
        let model = GradientBoostingRegressor::fit(&self.config, &scaler.transform(&x)?, &y)?;

        info!(
            series = target.name(),
            rows = y.len(),
            features = feature_columns.len(),
            trees = model.n_trees(),
            "returns model fitted"
        );

        let snapshot = FittedReturns {
            name: target.name().to_string(),
            feature_columns,
            scaler,
            model,
            last_value,
            last_date,
            training_rows: y.len(),
        };
        self.state.replace(snapshot)
    }

    /// Predicted percentage changes for each row of `features`.
    ///
    /// Training columns absent from `features`, and missing values, are
    /// taken as 0.0 before scaling.
    pub fn predict_changes(&self, features: &FeatureFrame) -> Result<Vec<f64>> {
        let fitted = self.state.fitted()?;
        let mut x = Array2::zeros((features.len(), fitted.feature_columns.len()));
        for (j, name) in fitted.feature_columns.iter().enumerate() {
            let Some(column) = features
                .numeric_columns()
                .find(|c| c.name() == name.as_str())
            else {
                debug!(column = %name, "feature absent at predict time, using 0.0");
                continue;
            };
            for (i, value) in column.values().iter().enumerate() {
                x[[i, j]] = value.unwrap_or(0.0);
            }
        }
        fitted.model.predict(&fitted.scaler.transform(&x)?)
    }

    /// Forecast levels over the dates of `features`.
    ///
    /// Compounds `level[i] = level[i-1] * (1 + pct[i] / 100)` starting from
    /// `start_level`, or the fit-time anchor when `None`.
    pub fn predict(&self, features: &FeatureFrame, start_level: Option<f64>) -> Result<Forecast> {
        let fitted = self.state.fitted()?;
        let changes = self.predict_changes(features)?;
        let values = compound(start_level.unwrap_or(fitted.last_value), &changes);

        Ok(Forecast::new(
            fitted.name.clone(),
            features.index().to_vec(),
            values,
            ForecastPath::CompoundedReturns,
        ))
    }
}

/// Sequentially compound percentage changes from `start`.
pub fn compound(start: f64, changes: &[f64]) -> Vec<f64> {
    changes
        .iter()
        .scan(start, |level, pct| {
            *level *= 1.0 + pct / 100.0;
            Some(*level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compound_from_own_predictions() {
        let levels = compound(100.0, &[10.0, 10.0, -50.0]);
        assert_relative_eq!(levels[0], 110.0, epsilon = 1e-12);
        assert_relative_eq!(levels[1], 121.0, epsilon = 1e-12);
        assert_relative_eq!(levels[2], 60.5, epsilon = 1e-12);
    }

    #[test]
    fn test_compound_empty() {
        assert!(compound(100.0, &[]).is_empty());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = ReturnsForecaster::default();
        let frame = FeatureFrame::new(Vec::new());
        assert!(matches!(model.predict(&frame, None), Err(ModelError::NotFitted)));
    }
}
