//! Zillow Home Value Index by ZIP code.
//!
//! The published table has one row per region with a `RegionName` column
//! holding the ZIP code and one column per month (`YYYY-MM-DD`). ZIP codes
//! usually arrive as integers, so `08901` is stored as `8901`.

use crate::cache::SqliteCache;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use foresight_features::{TARGET_COLUMN, TimeSeries};
use polars::prelude::*;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public ZHVI CSV for ZIP codes (middle tier, smoothed, seasonally adjusted).
pub const ZILLOW_ZIP_URL: &str = "https://files.zillowstatic.com/research/public_csvs/zhvi/Zip_zhvi_uc_sfrcondo_tier_0.33_0.67_sm_sa_month.csv";

/// Cache key for the raw table.
pub const CACHE_KEY: &str = "zillow_zip_zhvi";

/// Column holding the region code.
pub const REGION_COLUMN: &str = "RegionName";

const SAMPLE_CODES: usize = 10;

/// Downloads and caches the ZIP-level ZHVI table.
#[derive(Debug)]
pub struct ZillowProvider<'a> {
    cache: Option<&'a SqliteCache>,
    client: reqwest::Client,
    url: String,
}

impl<'a> ZillowProvider<'a> {
    /// Create a provider for [`ZILLOW_ZIP_URL`].
    pub fn new(cache: Option<&'a SqliteCache>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("foresight/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            cache,
            client,
            url: ZILLOW_ZIP_URL.to_string(),
        })
    }

    /// Point the provider at a different table URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Table URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the full table, from cache unless `force_refresh` is set.
    ///
    /// A cached copy that no longer parses is discarded and downloaded again.
    pub async fn fetch_table(&self, force_refresh: bool) -> Result<DataFrame> {
        if let Some(cache) = self.cache
            && !force_refresh
            && let Some(bytes) = cache.load(CACHE_KEY)?
        {
            match parse_table(&bytes) {
                Ok(table) => {
                    debug!(rows = table.height(), "serving ZHVI table from cache");
                    return Ok(table);
                }
                Err(e) => warn!(error = %e, "cached ZHVI table is unreadable, downloading"),
            }
        }

        let bytes = self.download().await?;
        let table = parse_table(&bytes)?;
        info!(
            rows = table.height(),
            columns = table.width(),
            "downloaded ZHVI table"
        );

        if let Some(cache) = self.cache
            && let Err(e) = cache.save(&bytes, CACHE_KEY)
        {
            warn!(error = %e, "failed to cache ZHVI table");
        }
        Ok(table)
    }

    /// Home value series for one ZIP code.
    pub async fn get_series(&self, region: &str, force_refresh: bool) -> Result<TimeSeries> {
        let table = self.fetch_table(force_refresh).await?;
        extract_region_series(&table, region)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let failed = |e: reqwest::Error| DataError::Download {
            source_name: "Zillow ZHVI".to_string(),
            reason: e.to_string(),
        };

        debug!(url = %self.url, "downloading ZHVI table");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(failed)?;
        let bytes = response.bytes().await.map_err(failed)?;
        Ok(bytes.to_vec())
    }
}

fn is_date_column(name: &str) -> bool {
    name.starts_with("20") && name.contains('-')
}

fn typed_column(name: &str, raw: Vec<String>) -> Column {
    if name == REGION_COLUMN {
        let codes: Option<Vec<i64>> = raw.iter().map(|s| s.trim().parse().ok()).collect();
        return match codes {
            Some(codes) => Series::new(name.into(), codes).into(),
            None => Series::new(name.into(), raw).into(),
        };
    }
    if is_date_column(name) {
        let values: Vec<Option<f64>> = raw.iter().map(|s| s.trim().parse().ok()).collect();
        return Series::new(name.into(), values).into();
    }
    Series::new(name.into(), raw).into()
}

/// Parse the raw CSV into a DataFrame.
///
/// `RegionName` is Int64 when every code is an integer and String otherwise.
/// Month columns are Float64 with nulls for blank cells; the rest stay String.
pub fn parse_table(bytes: &[u8]) -> Result<DataFrame> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if !headers.iter().any(|h| h == REGION_COLUMN) {
        return Err(DataError::Parse(format!("missing {} column", REGION_COLUMN)));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(cells)
        .map(|(name, raw)| typed_column(name, raw))
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn zero_padded(code: &str) -> String {
    format!("{:0>5}", code)
}

fn find_region_row(table: &DataFrame, region: &str) -> Result<Option<usize>> {
    let column = table.column(REGION_COLUMN)?.as_materialized_series();
    let as_text = column.cast(&DataType::String)?;
    let codes: Vec<Option<&str>> = as_text.str()?.into_iter().collect();
    let integers: Vec<Option<i64>> = match column.dtype() {
        DataType::Int64 => column.i64()?.into_iter().collect(),
        _ => Vec::new(),
    };

    let padded = zero_padded(region);
    let parsed = region.trim().parse::<i64>().ok();
    let stripped = match parsed {
        Some(n) => n.to_string(),
        None => match region.trim_start_matches('0') {
            "" => "0".to_string(),
            rest => rest.to_string(),
        },
    };

    if let Some(row) = codes
        .iter()
        .position(|code| code.is_some_and(|c| zero_padded(c) == padded))
    {
        return Ok(Some(row));
    }
    if let Some(row) = codes.iter().position(|code| *code == Some(stripped.as_str())) {
        return Ok(Some(row));
    }
    if let Some(wanted) = parsed
        && let Some(row) = integers.iter().position(|code| *code == Some(wanted))
    {
        return Ok(Some(row));
    }
    Ok(codes.iter().position(|code| *code == Some(region)))
}

fn sample_codes(table: &DataFrame) -> Result<Vec<String>> {
    let column = table.column(REGION_COLUMN)?.as_materialized_series();
    let as_text = column.cast(&DataType::String)?;
    Ok(as_text
        .str()?
        .into_iter()
        .take(SAMPLE_CODES)
        .map(|code| code.unwrap_or("null").to_string())
        .collect())
}

/// Extract the monthly home value series for `region` from the raw table.
///
/// The code matches when it equals a row's code zero-padded to five digits,
/// with leading zeros stripped, or as an integer. Blank months are dropped.
pub fn extract_region_series(table: &DataFrame, region: &str) -> Result<TimeSeries> {
    let Some(row) = find_region_row(table, region)? else {
        return Err(DataError::RegionNotFound {
            region: region.to_string(),
            samples: sample_codes(table)?,
        });
    };

    let mut points = Vec::new();
    for name in table.get_column_names() {
        let name = name.as_str();
        if !is_date_column(name) {
            continue;
        }
        let date = NaiveDate::parse_from_str(name, "%Y-%m-%d")
            .map_err(|e| DataError::Parse(format!("bad month column {}: {}", name, e)))?;
        let values = table
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        if let Some(value) = values.f64()?.get(row)
            && value.is_finite()
        {
            points.push((date, value));
        }
    }

    debug!(region, points = points.len(), "extracted region series");
    Ok(TimeSeries::from_unsorted(TARGET_COLUMN, points)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
RegionID,SizeRank,RegionName,State,2024-01-31,2024-02-29,2024-03-31
61639,0,10025,NY,1200000.0,1210000.0,1220000.0
62037,1,8901,NJ,400000.0,,410000.0
";

    #[test]
    fn test_parse_table_types() {
        let table = parse_table(TABLE.as_bytes()).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.column(REGION_COLUMN).unwrap().dtype(),
            &DataType::Int64
        );
        assert_eq!(table.column("2024-02-29").unwrap().dtype(), &DataType::Float64);
        assert_eq!(table.column("State").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_parse_table_requires_region_column() {
        assert!(matches!(
            parse_table(b"a,b\n1,2\n"),
            Err(DataError::Parse(_))
        ));
    }

    #[test]
    fn test_text_region_codes_stay_strings() {
        let table = parse_table(b"RegionName,2024-01-31\n08901,1.0\nK1A,2.0\n").unwrap();
        assert_eq!(
            table.column(REGION_COLUMN).unwrap().dtype(),
            &DataType::String
        );
        let series = extract_region_series(&table, "8901").unwrap();
        assert_eq!(series.values(), &[1.0]);
    }

    #[test]
    fn test_blank_months_are_dropped() {
        let table = parse_table(TABLE.as_bytes()).unwrap();
        let series = extract_region_series(&table, "08901").unwrap();
        assert_eq!(series.name(), TARGET_COLUMN);
        assert_eq!(series.values(), &[400000.0, 410000.0]);
    }

    #[test]
    fn test_date_column_detection() {
        assert!(is_date_column("2000-01-31"));
        assert!(!is_date_column("RegionName"));
        assert!(!is_date_column("2000"));
    }

    #[tokio::test]
    async fn test_fetch_table_prefers_cache() {
        let cache = SqliteCache::in_memory().unwrap();
        cache.save(TABLE.as_bytes(), CACHE_KEY).unwrap();

        let provider = ZillowProvider::new(Some(&cache))
            .unwrap()
            .with_url("http://127.0.0.1:9/unreachable.csv");
        let series = provider.get_series("10025", false).await.unwrap();
        assert_eq!(series.len(), 3);
    }

    #[tokio::test]
    async fn test_download_failure_is_reported() {
        let provider = ZillowProvider::new(None)
            .unwrap()
            .with_url("http://127.0.0.1:9/unreachable.csv");
        let err = provider.fetch_table(true).await.unwrap_err();
        assert!(matches!(err, DataError::Download { .. }));
    }
}
