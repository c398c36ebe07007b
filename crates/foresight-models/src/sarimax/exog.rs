//! Exogenous regressor matrices.

use foresight_features::{FeatureError, FeatureFrame};
use ndarray::{Array2, Axis};

use crate::error::{ModelError, Result};

/// Named regressors, one row per month and one column per regressor.
#[derive(Debug, Clone, PartialEq)]
pub struct Exogenous {
    names: Vec<String>,
    values: Array2<f64>,
}

impl Exogenous {
    /// Build from a matrix; `names` labels its columns.
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(ModelError::DimensionMismatch {
                expected: values.ncols(),
                actual: names.len(),
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidParameter(
                "exogenous regressors must be finite".to_string(),
            ));
        }
        Ok(Self { names, values })
    }

    /// Take the named columns of a feature frame. Every value must be present.
    pub fn from_frame(frame: &FeatureFrame, names: &[&str]) -> Result<Self> {
        let mut values = Array2::zeros((frame.len(), names.len()));
        for (j, name) in names.iter().enumerate() {
            let column = frame
                .column(name)
                .ok_or_else(|| FeatureError::MissingColumn((*name).to_string()))?;
            for (i, value) in column.values().iter().enumerate() {
                values[[i, j]] = value.ok_or_else(|| {
                    ModelError::InvalidParameter(format!("missing value in regressor {}", name))
                })?;
            }
        }
        Self::new(names.iter().map(|n| (*n).to_string()).collect(), values)
    }

    /// Regressor names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values, rows by time.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Number of regressors.
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// `horizon` rows each equal to the last observed row.
    pub fn hold_last(&self, horizon: usize) -> Result<Self> {
        let last = self
            .values
            .axis_iter(Axis(0))
            .last()
            .ok_or(ModelError::InsufficientData {
                required: 1,
                actual: 0,
            })?;
        let mut values = Array2::zeros((horizon, self.width()));
        for mut row in values.axis_iter_mut(Axis(0)) {
            row.assign(&last);
        }
        Ok(Self {
            names: self.names.clone(),
            values,
        })
    }

    /// Column `j` as a vector.
    pub(crate) fn column(&self, j: usize) -> Vec<f64> {
        self.values.column(j).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use foresight_features::ColumnKind;
    use ndarray::array;

    #[test]
    fn test_from_frame() {
        let index = vec![
            NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
        ];
        let mut frame = FeatureFrame::new(index);
        frame
            .with_column("mortgage_rate", ColumnKind::Numeric, vec![Some(6.0), Some(6.5)])
            .unwrap();
        frame
            .with_column("inventory", ColumnKind::Numeric, vec![Some(900.0), None])
            .unwrap();

        let exog = Exogenous::from_frame(&frame, &["mortgage_rate"]).unwrap();
        assert_eq!(exog.values(), &array![[6.0], [6.5]]);
        assert!(Exogenous::from_frame(&frame, &["inventory"]).is_err());
        assert!(matches!(
            Exogenous::from_frame(&frame, &["hpi"]),
            Err(ModelError::Feature(FeatureError::MissingColumn(_)))
        ));
    }

    #[test]
    fn test_hold_last() {
        let exog = Exogenous::new(
            vec!["a".to_string(), "b".to_string()],
            array![[1.0, 2.0], [3.0, 4.0]],
        )
        .unwrap();
        let future = exog.hold_last(3).unwrap();

        assert_eq!(future.len(), 3);
        assert_eq!(future.values(), &array![[3.0, 4.0], [3.0, 4.0], [3.0, 4.0]]);
    }
}
