//! Feature construction from an aligned frame.
//!
//! Lag and percentage-change columns let a regressor with no notion of time
//! see autocorrelation and momentum; month dummies stand in for seasonality.
//!
//! Output columns, in order:
//! - the aligned level columns (`home_value`, `mortgage_rate`, `inventory`, `hpi`)
//! - `<col>_lag_1`, `<col>_lag_12` for target, mortgage rate and inventory
//! - `home_value_pct`, the percent change of the target
//! - `month`, categorical month of year
//! - `month_2` .. `month_12`, with January as the reference month

use crate::align::AlignedFrame;
use crate::error::{FeatureError, Result};
use crate::frame::{ColumnKind, FeatureFrame};
use crate::series::SeriesKind;
use chrono::Datelike;
use tracing::debug;

/// Lags derived for every lagged series.
pub const LAGS: [usize; 2] = [1, 12];

/// Target column name.
pub const TARGET_COLUMN: &str = SeriesKind::HomeValue.column_name();

/// Target percent change column name.
pub const PCT_COLUMN: &str = "home_value_pct";

/// Categorical month-of-year column name.
pub const MONTH_COLUMN: &str = "month";

/// Build the feature frame from an aligned frame holding at least the target.
pub fn build_features(aligned: &AlignedFrame) -> Result<FeatureFrame> {
    let target = aligned
        .column(SeriesKind::HomeValue)
        .ok_or_else(|| FeatureError::MissingColumn(TARGET_COLUMN.to_string()))?;

    let mut frame = FeatureFrame::new(aligned.index().to_vec());

    for kind in aligned.kinds() {
        if let Some(values) = aligned.column(kind) {
            frame.with_column(kind.column_name(), ColumnKind::Numeric, dense(values))?;
        }
    }

    for kind in aligned.kinds().filter(|k| k.is_lagged()) {
        let Some(values) = aligned.column(kind) else {
            continue;
        };
        let base = dense(values);
        for k in LAGS {
            frame.with_column(
                format!("{}_lag_{}", kind.column_name(), k),
                ColumnKind::Numeric,
                lag(&base, k),
            )?;
        }
    }

    frame.with_column(PCT_COLUMN, ColumnKind::Numeric, pct_change(&dense(target)))?;

    let months: Vec<u32> = aligned.index().iter().map(Datelike::month).collect();
    frame.with_column(
        MONTH_COLUMN,
        ColumnKind::Categorical,
        months.iter().map(|m| Some(f64::from(*m))).collect(),
    )?;
    for month in 2..=12u32 {
        frame.with_column(
            format!("month_{}", month),
            ColumnKind::Numeric,
            months
                .iter()
                .map(|m| Some(if *m == month { 1.0 } else { 0.0 }))
                .collect(),
        )?;
    }

    frame.set_target(TARGET_COLUMN)?;
    let frame = frame.drop_missing_target()?;

    debug!(
        rows = frame.len(),
        columns = frame.width(),
        "built feature frame"
    );

    Ok(frame)
}

/// Shift `values` forward by `k` rows; the first `k` rows become missing.
pub fn lag(values: &[Option<f64>], k: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let missing = k.min(n);
    std::iter::repeat_n(None, missing)
        .chain(values[..n - missing].iter().copied())
        .collect()
}

/// Percent change over the prior row, in percent units.
///
/// Missing when either row is missing or the change is not finite.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    out.push(None);
    out.extend(values.windows(2).map(|pair| match (pair[0], pair[1]) {
        (Some(prev), Some(curr)) => {
            let change = (curr / prev - 1.0) * 100.0;
            change.is_finite().then_some(change)
        }
        _ => None,
    }));
    out
}

fn dense(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.is_finite().then_some(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lag() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(lag(&values, 1), vec![None, Some(1.0), Some(2.0)]);
        assert_eq!(lag(&values, 12), vec![None, None, None]);
        assert!(lag(&[], 1).is_empty());
    }

    #[test]
    fn test_pct_change() {
        let pct = pct_change(&[Some(100.0), Some(105.0), None, Some(0.0), Some(1.0)]);
        assert_eq!(pct.len(), 5);
        assert_eq!(pct[0], None);
        assert_relative_eq!(pct[1].unwrap(), 5.0, epsilon = 1e-9);
        assert_eq!(pct[2], None);
        assert_eq!(pct[3], None);
        assert_eq!(pct[4], None);
    }

    #[test]
    fn test_missing_target() {
        assert!(matches!(
            build_features(&AlignedFrame::default()),
            Err(FeatureError::MissingColumn(_))
        ));
    }
}
