//! End-to-end tests for the demand crate
//!
//! Runs complete pipelines through the public API only.

use demand::prelude::*;
use demand::{SarimaEstimator, SarimaForecaster, StepwiseSelector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn start() -> YearMonth {
    YearMonth::new(2014, 1).unwrap()
}

/// `1000 + 50t + 200 sin(2πt/12)` plus a random-walk disturbance
fn trend_seasonal_values(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut walk = 0.0;
    (0..n)
        .map(|t| {
            walk += normal.sample(&mut rng);
            let tf = t as f64;
            1000.0 + 50.0 * tf + 200.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
                + 30.0 * walk
        })
        .collect()
}

fn raw(values: &[f64]) -> Vec<RawObservation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| RawObservation::new(start().offset(i as i64), v))
        .collect()
}

/// `1000 + 50t + 200 sin(2πt/12)` with no disturbance
fn noise_free_values(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let tf = t as f64;
            1000.0 + 50.0 * tf + 200.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
        })
        .collect()
}

fn pure_seasonal(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| 150.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin())
        .collect()
}

#[test]
fn e2e_trend_seasonal_workflow() {
    let values = trend_seasonal_values(72, 2014);
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();

    let report = pipeline.run(&raw(&values), 24).unwrap();
    assert_eq!(pipeline.stage(), PipelineStage::Forecasted);
    assert!(report.series.replacements().is_empty());

    // Linearity
    assert!(report.linearity.correlation >= 0.7);
    assert!(report.linearity.is_linear);
    assert!(report.linearity.slope > 0.0);

    // Decomposition identity wherever the trend is defined
    let d = &report.decomposition;
    assert_eq!(d.period, 12);
    for (i, value) in report.series.values().iter().enumerate() {
        if let Some(rebuilt) = d.reconstruct(i) {
            assert!((value - rebuilt).abs() < 1e-6);
        }
    }
    assert!(d.seasonal_indices.iter().sum::<f64>().abs() < 1e-6);

    // Stationarity: level fails, first difference passes
    let s = &report.stationarity;
    assert!(!s.attempts[0].is_stationary);
    assert_eq!(s.differencing_order, 1);
    assert!(s.is_stationary);

    // Selection
    let selection = &report.selection;
    assert_eq!(selection.best_spec().order.d, 1);
    assert!(selection
        .shortlist
        .iter()
        .any(|e| e.spec.seasonal_order.period == 12));
    let best_aic = selection.best_spec().aic;
    for entry in selection.accepted() {
        assert!(best_aic <= entry.spec.aic);
    }

    // Forecast
    let forecast = &report.forecast;
    assert_eq!(forecast.horizon(), 24);
    assert_eq!(forecast.horizon_points[0].period, YearMonth::new(2020, 1).unwrap());
    let mut previous_width = 0.0;
    for point in &forecast.horizon_points {
        assert!(point.lower_bound <= point.point_forecast);
        assert!(point.point_forecast <= point.upper_bound);
        assert!(point.interval_width() >= previous_width - 1e-9);
        previous_width = point.interval_width();
    }
    // the trend carries forward
    assert!(forecast.horizon_points[23].point_forecast > values[71]);
}

#[test]
fn e2e_backtest_metrics_reported() {
    let values = trend_seasonal_values(72, 2014);
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run(&raw(&values), 12).unwrap();

    let metrics = report.forecast.metrics;
    assert!(metrics.is_available());
    assert_eq!(metrics.holdout, 12);
    assert!(metrics.mae.is_finite() && metrics.mae >= 0.0);
    assert!(metrics.rmse >= metrics.mae - 1e-9);
    assert!(metrics.mape.is_finite() && metrics.mape >= 0.0);
    assert_eq!(metrics.mape_excluded, 0);
}

#[test]
fn e2e_backtest_unavailable_when_holdout_covers_series() {
    let values = trend_seasonal_values(48, 9);
    let model = SarimaEstimator::new()
        .fit(
            &values,
            start().offset(47),
            Order::new(1, 1, 0),
            SeasonalOrder::new(0, 1, 0, 12),
        )
        .unwrap();
    let forecaster = SarimaForecaster::new(BacktestConfig { holdout: Some(48) });

    // the forecast itself still succeeds
    let result = forecaster.forecast(&model, 6, 0.95).unwrap();
    assert_eq!(result.horizon(), 6);
    assert!(!result.metrics.is_available());
    assert_eq!(result.metrics.holdout, 0);
    assert!(result.metrics.mae.is_nan());
    assert!(result.metrics.mape.is_nan());
}

#[test]
fn e2e_noise_free_trend_seasonal_scenario() {
    let values = noise_free_values(72);
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run(&raw(&values), 24).unwrap();

    assert!(report.series.replacements().is_empty());
    assert_eq!(report.series.values(), values);

    assert!(report.linearity.is_linear);
    assert!(report.linearity.correlation >= 0.7);

    let s = &report.stationarity;
    assert!(!s.attempts[0].is_stationary);
    assert!(s.attempts[0].p_value > 0.05);
    assert_eq!(s.differencing_order, 1);
    assert!(s.is_stationary);

    assert!(report
        .selection
        .shortlist
        .iter()
        .any(|e| e.spec.seasonal_order.period == 12));

    // the seasonal peak sits in April, three months after the January start
    let d = &report.decomposition;
    let april = d
        .seasonal_index_for(start(), YearMonth::new(2014, 4).unwrap())
        .unwrap();
    assert!((april - 200.0).abs() < 1e-6);
    let january = d.seasonal_index_for(start(), start().offset(24)).unwrap();
    assert!(january.abs() < 1e-6);

    assert_eq!(report.forecast.horizon(), 24);
    assert!(report.forecast.horizon_points[23].point_forecast > values[71]);
}

#[test]
fn e2e_annual_summary_and_peak() {
    let values = trend_seasonal_values(72, 2014);
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run(&raw(&values), 24).unwrap();

    let summaries = report.forecast.annual_summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].year, 2020);
    assert_eq!(summaries[0].months, 12);
    assert!(summaries[0].growth_rate.is_none());
    assert!(summaries[1].growth_rate.is_some());

    let peak = report.forecast.peak().unwrap();
    assert!(report
        .forecast
        .horizon_points
        .iter()
        .all(|p| p.point_forecast <= peak.point_forecast));
}

#[test]
fn e2e_constant_series_is_degenerate() {
    let values = vec![250.0; 36];
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();

    let err = pipeline.run(&raw(&values), 12).unwrap_err();
    assert!(matches!(err, DemandError::DegenerateSeries { len: 36, .. }));
    // halted after validation
    assert_eq!(pipeline.stage(), PipelineStage::Validated);
    assert!(pipeline.forecast_result().is_none());
}

#[test]
fn e2e_seasonal_round_trip() {
    let values = pure_seasonal(48);
    let series = ObservationSeries::from_values(start(), &values);
    let config = PipelineConfig::default();

    let outcome = StepwiseSelector::from_config(&config).select(&series, 0).unwrap();
    assert_eq!(outcome.best_spec().seasonal_order.d, 1);

    let result = SarimaForecaster::from_config(&config)
        .forecast(&outcome.best, 24, 0.95)
        .unwrap();
    for (h, point) in result.horizon_points.iter().enumerate() {
        let expected = 150.0 * (2.0 * std::f64::consts::PI * (48 + h) as f64 / 12.0).sin();
        assert!(
            (point.point_forecast - expected).abs() < 1e-3,
            "h={} got {} expected {}",
            h,
            point.point_forecast,
            expected
        );
    }
}

#[test]
fn e2e_stage_gating() {
    let values = trend_seasonal_values(72, 2014);
    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();

    assert!(matches!(
        pipeline.select_model(),
        Err(DemandError::InvalidStageTransition {
            current: PipelineStage::Idle,
            requested: PipelineStage::ModelSelected,
        })
    ));

    pipeline.validate(&raw(&values)).unwrap();
    assert!(matches!(
        pipeline.decompose(),
        Err(DemandError::InvalidStageTransition { .. })
    ));
    pipeline.analyze_linearity().unwrap();
    pipeline.decompose().unwrap();
    pipeline.test_stationarity().unwrap();
    assert_eq!(pipeline.stage(), PipelineStage::StationarityDone);

    pipeline
        .select_manual(Order::new(1, 1, 0), SeasonalOrder::new(0, 1, 0, 12))
        .unwrap();
    let result = pipeline.forecast(6).unwrap();
    assert_eq!(result.horizon(), 6);

    // a finished run must be reset before another validation
    assert!(pipeline.validate(&raw(&values)).is_err());
    pipeline.reset();
    assert_eq!(pipeline.stage(), PipelineStage::Idle);
}

#[test]
fn e2e_repairs_gap_and_outlier() {
    let mut values = trend_seasonal_values(60, 7);
    values[30] += 5000.0;
    let mut records = raw(&values);
    let removed = records.remove(40);

    let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
    let series = pipeline.validate(&records).unwrap();

    assert_eq!(series.len(), 60);
    assert_eq!(series.observations()[40].period, removed.period.unwrap());
    assert!(series.outlier_positions().contains(&30));
    assert!(series.values()[30] < values[30] - 1000.0);
    assert!(series
        .replacements()
        .iter()
        .any(|r| r.index == 40 && r.cause == demand::ReplacementCause::GapFill));
}
