//! Month-end calendar arithmetic.
//!
//! Every date handled by Foresight is normalised to the last day of its
//! calendar month, the convention used by the ZHVI and PMMS data sets.

use chrono::{Datelike, Months, NaiveDate};

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

/// Month-end date `months` calendar months after the month of `date`.
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(months)))
        .map_or(NaiveDate::MAX, month_end)
}

/// Absolute month number, used as a join key between series.
pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

/// Signed number of calendar months from `start` to `end`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    month_index(end) - month_index(start)
}

/// Inclusive month-end calendar from the month of `start` to the month of `end`.
///
/// Returns an empty calendar when `end` precedes `start`.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let span = months_between(start, end);
    if span < 0 {
        return Vec::new();
    }
    (0..=span as u32).map(|k| add_months(start, k)).collect()
}

/// The `horizon` month-end dates following `last`.
pub fn future_months(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u32).map(|k| add_months(last, k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_end() {
        assert_eq!(month_end(ymd(2024, 2, 10)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 2, 1)), ymd(2023, 2, 28));
        assert_eq!(month_end(ymd(2024, 12, 31)), ymd(2024, 12, 31));
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(ymd(2024, 11, 30), 1), ymd(2024, 12, 31));
        assert_eq!(add_months(ymd(2024, 12, 31), 1), ymd(2025, 1, 31));
        assert_eq!(add_months(ymd(2024, 1, 31), 1), ymd(2024, 2, 29));
    }

    #[test]
    fn test_month_range() {
        let range = month_range(ymd(2023, 11, 1), ymd(2024, 2, 15));
        assert_eq!(
            range,
            vec![
                ymd(2023, 11, 30),
                ymd(2023, 12, 31),
                ymd(2024, 1, 31),
                ymd(2024, 2, 29)
            ]
        );
        assert!(month_range(ymd(2024, 2, 1), ymd(2023, 2, 1)).is_empty());
    }

    #[test]
    fn test_future_months() {
        let future = future_months(ymd(2024, 12, 31), 3);
        assert_eq!(future, vec![ymd(2025, 1, 31), ymd(2025, 2, 28), ymd(2025, 3, 31)]);
    }
}
