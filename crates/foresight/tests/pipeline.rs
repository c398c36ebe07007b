//! Full forecast runs on synthetic market data.

use chrono::NaiveDate;
use foresight::{ForecastConfig, ModelKind, PipelineError, run_forecast};
use foresight_data::{HpiProvider, InventoryProvider, MortgageRateProvider, SeriesProvider};
use foresight_features::calendar::{add_months, months_between};
use foresight_features::{MarketSeries, TimeSeries};
use foresight_models::{BoostingConfig, ForecastPath};
use rstest::rstest;

fn home_values(months: u32) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2005, 1, 31).unwrap();
    TimeSeries::new(
        "home_value",
        (0..months).map(|i| {
            let t = f64::from(i);
            let seasonal = 1_500.0 * (t * std::f64::consts::PI / 6.0).sin();
            (add_months(start, i), 250_000.0 * 1.003_f64.powf(t) + seasonal)
        }),
    )
    .unwrap()
}

fn market(months: u32) -> MarketSeries {
    MarketSeries::new(home_values(months))
        .with_mortgage_rate(MortgageRateProvider::new(None).get_series(false).unwrap())
        .with_inventory(InventoryProvider::new(None).get_series(false).unwrap())
        .with_hpi(HpiProvider::new(None).get_series(false).unwrap())
}

fn quick_boosting() -> ForecastConfig {
    ForecastConfig {
        boosting: BoostingConfig {
            n_estimators: 25,
            max_depth: 3,
            ..BoostingConfig::default()
        },
        ..ForecastConfig::for_model(ModelKind::GradientBoosting)
    }
}

#[rstest]
#[case::sarimax(ForecastConfig::for_model(ModelKind::Sarimax))]
#[case::boosting(quick_boosting())]
fn test_forecast_covers_horizon(#[case] config: ForecastConfig) {
    let series = market(120);
    let report = run_forecast("08901", &series, &config).unwrap();

    assert_eq!(report.model, config.model);
    assert_eq!(report.forecast.len(), 60);
    assert_eq!(report.history.len(), 24);

    let anchor = report.history.last().unwrap().date;
    for (k, point) in report.forecast.iter().enumerate() {
        assert_eq!(months_between(anchor, point.date), k as i32 + 1);
        assert!(point.value.is_finite());
    }
    assert_eq!(report.final_value, report.forecast.last().unwrap().value);
}

#[test]
fn test_history_ends_at_aligned_calendar_end() {
    // Macro series run through 2024, so the target is forward filled to there.
    let report = run_forecast("08901", &market(120), &quick_boosting()).unwrap();
    let anchor = report.history.last().unwrap().date;
    assert_eq!(anchor, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
}

#[test]
fn test_boosting_compounds_from_current_value() {
    let report = run_forecast("08901", &market(120), &quick_boosting()).unwrap();
    assert_eq!(report.path, ForecastPath::CompoundedReturns);
    assert!(report.interval.is_none());
    assert!(report.forecast.iter().all(|p| p.value > 0.0));
}

#[test]
fn test_target_only_market() {
    let series = MarketSeries::new(home_values(72));
    let config = ForecastConfig::for_model(ModelKind::Sarimax).with_horizon(12);
    let report = run_forecast("10025", &series, &config).unwrap();
    assert_eq!(report.forecast.len(), 12);
    assert!(report.current_value > 0.0);
}

#[test]
fn test_zero_horizon_is_rejected() {
    let config = ForecastConfig::default().with_horizon(0);
    assert!(matches!(
        run_forecast("08901", &market(120), &config),
        Err(PipelineError::InvalidHorizon(0))
    ));
}

#[test]
fn test_missing_target_is_an_error() {
    let series = MarketSeries::default()
        .with_mortgage_rate(MortgageRateProvider::new(None).get_series(false).unwrap());
    assert!(matches!(
        run_forecast("08901", &series, &ForecastConfig::default()),
        Err(PipelineError::Feature(_))
    ));
}
