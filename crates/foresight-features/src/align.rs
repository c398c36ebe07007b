//! Series alignment onto a shared month-end calendar.
//!
//! Each present series is reindexed onto the calendar spanning the union of
//! all input months, then forward filled and backward filled. True gaps are
//! flattened into plateaus; nothing inside the span is left missing.

use crate::calendar::{month_index, month_range};
use crate::series::{MarketSeries, SeriesKind, TimeSeries};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Dense, gap-free table of the present market series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedFrame {
    index: Vec<NaiveDate>,
    columns: BTreeMap<SeriesKind, Vec<f64>>,
}

impl AlignedFrame {
    /// Shared month-end index.
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

    /// Aligned values for `kind`, if that series was supplied.
    pub fn column(&self, kind: SeriesKind) -> Option<&[f64]> {
        self.columns.get(&kind).map(Vec::as_slice)
    }

    /// Whether `kind` was supplied.
    pub fn contains(&self, kind: SeriesKind) -> bool {
        self.columns.contains_key(&kind)
    }

    /// Kinds present in the frame, in [`SeriesKind::ALL`] order.
    pub fn kinds(&self) -> impl Iterator<Item = SeriesKind> + '_ {
        self.columns.keys().copied()
    }
}

/// Align every present series onto the month-end calendar covering all of them.
///
/// Absent and empty series are omitted. When no series is present the
/// result has an empty index; callers must supply at least one non-empty
/// series for the frame to be useful.
pub fn align_series(series: &MarketSeries) -> AlignedFrame {
    let present: Vec<(SeriesKind, &TimeSeries)> = series.present().collect();

    let bounds = present
        .iter()
        .filter_map(|(_, s)| Some((s.first_date()?, s.last_date()?)))
        .reduce(|(lo, hi), (first, last)| (lo.min(first), hi.max(last)));

    let Some((start, end)) = bounds else {
        return AlignedFrame::default();
    };

    let index = month_range(start, end);
    debug!(
        start = %start,
        end = %end,
        months = index.len(),
        series = present.len(),
        "aligning series"
    );

    let columns = present
        .into_iter()
        .map(|(kind, s)| (kind, reindex_filled(s, &index)))
        .collect();

    AlignedFrame { index, columns }
}

/// Reindex onto `index`, forward fill, then backward fill.
fn reindex_filled(series: &TimeSeries, index: &[NaiveDate]) -> Vec<f64> {
    let by_month: HashMap<i32, f64> = series
        .iter()
        .map(|(date, value)| (month_index(date), value))
        .collect();

    let mut values: Vec<Option<f64>> = index
        .iter()
        .map(|date| by_month.get(&month_index(*date)).copied())
        .collect();

    forward_fill(&mut values);
    backward_fill(&mut values);

    // A non-empty series inside the span leaves nothing unfilled.
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Carry the last known value forward into subsequent gaps.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

/// Carry the first known value backward into leading gaps.
pub fn backward_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fill_helpers() {
        let mut values = vec![None, Some(1.0), None, Some(3.0), None];
        forward_fill(&mut values);
        assert_eq!(values, vec![None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);
        backward_fill(&mut values);
        assert_eq!(values[0], Some(1.0));
    }

    #[test]
    fn test_union_span_and_fill() {
        let target = TimeSeries::new(
            "zhvi",
            [(ymd(2024, 2, 29), 200.0), (ymd(2024, 4, 30), 220.0)],
        )
        .unwrap();
        let rate = TimeSeries::new(
            "rate",
            [(ymd(2024, 1, 31), 6.5), (ymd(2024, 2, 29), 6.7)],
        )
        .unwrap();
        let aligned = align_series(&MarketSeries::new(target).with_mortgage_rate(rate));

        assert_eq!(
            aligned.index(),
            &[ymd(2024, 1, 31), ymd(2024, 2, 29), ymd(2024, 3, 31), ymd(2024, 4, 30)]
        );
        assert_eq!(
            aligned.column(SeriesKind::HomeValue).unwrap(),
            &[200.0, 200.0, 200.0, 220.0]
        );
        assert_eq!(
            aligned.column(SeriesKind::MortgageRate).unwrap(),
            &[6.5, 6.7, 6.7, 6.7]
        );
        assert!(!aligned.contains(SeriesKind::Inventory));
    }

    #[test]
    fn test_all_absent_gives_empty_index() {
        let aligned = align_series(&MarketSeries::default());
        assert!(aligned.is_empty());
        assert_eq!(aligned.kinds().count(), 0);
    }
}
