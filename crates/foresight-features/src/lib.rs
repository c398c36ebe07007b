#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/foresight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod align;
pub mod build;
pub mod calendar;
pub mod error;
pub mod frame;
pub mod series;

pub use align::{AlignedFrame, align_series};
pub use build::{
    LAGS, MONTH_COLUMN, PCT_COLUMN, TARGET_COLUMN, build_features, lag, pct_change,
};
pub use error::{FeatureError, Result};
pub use frame::{ColumnKind, FeatureColumn, FeatureFrame};
pub use series::{MarketSeries, SeriesKind, TimeSeries};
