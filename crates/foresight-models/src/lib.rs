#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/foresight/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod boosting;
pub mod error;
pub mod forecast;
pub mod linalg;
pub mod regression;
pub mod sarimax;
pub mod scaler;
pub mod state;

// Re-export main types
pub use boosting::{BoostingConfig, GradientBoostingRegressor};
pub use error::{ModelError, Result};
pub use forecast::{Forecast, ForecastInterval, ForecastPath};
pub use regression::{FittedReturns, ReturnsForecaster};
pub use sarimax::{
    Exogenous, FitTier, FittedSarimax, Order, SarimaxConfig, SeasonalForecaster, SeasonalOrder,
};
pub use scaler::StandardScaler;
pub use state::ModelState;
