//! Feature frame: named optional-valued columns over a monthly index.

use crate::calendar::month_end;
use crate::error::{FeatureError, Result};
use crate::series::TimeSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a column may be consumed by a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Continuous or indicator values usable as regressors
    Numeric,
    /// Integer category codes (e.g. month of year); not a regressor
    Categorical,
}

impl ColumnKind {
    /// Whether the column is selected by numeric-only consumers.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Numeric)
    }
}

/// A single named column; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    name: String,
    kind: ColumnKind,
    values: Vec<Option<f64>>,
}

impl FeatureColumn {
    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column kind.
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }

    /// Column values.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Last value of the column, missing or not.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }
}

/// Table keyed by a shared monthly date index with one designated target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    index: Vec<NaiveDate>,
    columns: Vec<FeatureColumn>,
    target: Option<String>,
}

impl FeatureFrame {
    /// An empty frame over `index`, with every date moved to its month end.
    pub fn new(index: Vec<NaiveDate>) -> Self {
        Self {
            index: index.into_iter().map(month_end).collect(),
            columns: Vec::new(),
            target: None,
        }
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn with_column(
        &mut self,
        name: impl Into<String>,
        kind: ColumnKind,
        values: Vec<Option<f64>>,
    ) -> Result<()> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(FeatureError::LengthMismatch {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }

        let column = FeatureColumn { name, kind, values };
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Designate an existing column as the target.
    pub fn set_target(&mut self, name: &str) -> Result<()> {
        if self.column(name).is_none() {
            return Err(FeatureError::MissingColumn(name.to_string()));
        }
        self.target = Some(name.to_string());
        Ok(())
    }

    /// Name of the target column, if one is designated and still present.
    pub fn target_name(&self) -> Option<&str> {
        self.target
            .as_deref()
            .filter(|name| self.column(name).is_some())
    }

    /// Shared date index.
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Number of rows.
    pub const fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the frame has no rows.
    pub const fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub const fn width(&self) -> usize {
        self.columns.len()
    }

    /// All columns in insertion order.
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns usable as regressors.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &FeatureColumn> + '_ {
        self.columns.iter().filter(|c| c.kind.is_numeric())
    }

    /// The target column as a series, skipping missing rows.
    pub fn target_series(&self) -> Result<TimeSeries> {
        let name = self
            .target_name()
            .ok_or_else(|| FeatureError::MissingColumn("<target>".to_string()))?;
        let column = self
            .column(name)
            .ok_or_else(|| FeatureError::MissingColumn(name.to_string()))?;
        let points = self
            .index
            .iter()
            .zip(&column.values)
            .filter_map(|(date, value)| value.map(|v| (*date, v)));
        TimeSeries::new(name, points)
    }

    /// A copy without the named columns. Unknown names are ignored.
    pub fn without(&self, names: &[&str]) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| !names.contains(&c.name.as_str()))
                .cloned()
                .collect(),
            target: self.target.clone(),
        }
    }

    /// Keep the rows where `keep` is true.
    pub fn filter_rows(&self, keep: &[bool]) -> Self {
        let pick = |values: &[Option<f64>]| -> Vec<Option<f64>> {
            values
                .iter()
                .zip(keep)
                .filter_map(|(v, k)| k.then_some(*v))
                .collect()
        };
        Self {
            index: self
                .index
                .iter()
                .zip(keep)
                .filter_map(|(d, k)| k.then_some(*d))
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|c| FeatureColumn {
                    name: c.name.clone(),
                    kind: c.kind,
                    values: pick(&c.values),
                })
                .collect(),
            target: self.target.clone(),
        }
    }

    /// Drop every row whose target value is missing.
    pub fn drop_missing_target(self) -> Result<Self> {
        let name = self
            .target_name()
            .ok_or_else(|| FeatureError::MissingColumn("<target>".to_string()))?;
        let keep: Vec<bool> = self
            .column(name)
            .map(|c| c.values.iter().map(Option::is_some).collect())
            .unwrap_or_default();
        Ok(self.filter_rows(&keep))
    }

    /// A frame over `dates` where every column repeats its last observed value.
    ///
    /// Columns whose last row is missing stay missing. Dates are moved to
    /// their month end.
    pub fn repeat_last(&self, dates: Vec<NaiveDate>) -> Self {
        let rows = dates.len();
        Self {
            index: dates.into_iter().map(month_end).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| FeatureColumn {
                    name: c.name.clone(),
                    kind: c.kind,
                    values: vec![c.last(); rows],
                })
                .collect(),
            target: self.target.clone(),
        }
    }
}
