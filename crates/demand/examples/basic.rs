//! Full pipeline on a synthetic monthly demand series.
//!
//! ```text
//! RUST_LOG=demand_core=debug cargo run -p demand --example basic
//! ```

use demand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn synthetic_demand(start: YearMonth, months: usize) -> Vec<RawObservation> {
    let mut rng = StdRng::seed_from_u64(42);
    let shock = Normal::new(0.0, 30.0).unwrap();
    let mut level = 0.0;
    (0..months)
        .map(|t| {
            level += shock.sample(&mut rng);
            let tf = t as f64;
            let value = 1000.0
                + 50.0 * tf
                + 200.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
                + level;
            RawObservation::new(start.offset(t as i64), value)
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demand_core=info".into()),
        )
        .init();

    let start = YearMonth::new(2018, 1)
        .ok_or_else(|| DemandError::invalid_parameter("start", "not a calendar month"))?;
    let raw = synthetic_demand(start, 72);

    let mut pipeline = ForecastPipeline::new(PipelineConfig::default())?;
    let report = pipeline.run(&raw, 24)?;

    println!("=== Diagnostics ===");
    println!(
        "linearity: r = {:.3}, p = {:.2e}, linear = {}",
        report.linearity.correlation, report.linearity.p_value, report.linearity.is_linear
    );
    println!(
        "seasonal strength: {:.3}",
        report.decomposition.seasonal_strength
    );
    println!(
        "ADF: statistic = {:.3}, p = {:.3}, d = {}",
        report.stationarity.statistic,
        report.stationarity.p_value,
        report.stationarity.differencing_order
    );

    println!("\n=== Model shortlist ===");
    for entry in report.selection.shortlist.iter().take(8) {
        match entry.rejection() {
            None => println!("  {:<28} AIC {:>9.2}", entry.spec.label(), entry.spec.aic),
            Some(reason) => println!("  {:<28} rejected: {}", entry.spec.label(), reason),
        }
    }
    if report.selection.search_truncated {
        println!("  (search stopped on its budget)");
    }

    let forecast = &report.forecast;
    println!("\n=== Forecast ({:.0}% intervals) ===", forecast.confidence_level * 100.0);
    for point in &forecast.horizon_points {
        println!(
            "  {}  {:>9.1}  [{:>9.1}, {:>9.1}]",
            point.period, point.point_forecast, point.lower_bound, point.upper_bound
        );
    }

    println!("\n=== Annual summary ===");
    for summary in forecast.annual_summaries() {
        let growth = summary
            .growth_rate
            .map(|g| format!("{:+.1}%", g))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}  total {:>10.1}  avg {:>8.1}  growth {}",
            summary.year, summary.total, summary.average, growth
        );
    }
    if let Some(peak) = forecast.peak() {
        println!("  peak demand {:.1} in {}", peak.point_forecast, peak.period);
    }

    let metrics = forecast.metrics;
    if metrics.is_available() {
        println!(
            "\nbacktest over {} months: MAE {:.2}, RMSE {:.2}, MAPE {:.2}%",
            metrics.holdout, metrics.mae, metrics.rmse, metrics.mape
        );
    } else {
        println!("\nbacktest unavailable");
    }

    Ok(())
}
