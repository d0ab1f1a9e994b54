//! # demand
//!
//! Monthly demand forecasting: series validation with outlier repair,
//! linearity and seasonal diagnostics, ADF-driven differencing, stepwise
//! SARIMA selection by AIC, and forecasts with prediction intervals and
//! holdout accuracy.
//!
//! ```no_run
//! use demand::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let start = YearMonth::new(2019, 1)
//!     .ok_or_else(|| DemandError::invalid_parameter("start", "not a calendar month"))?;
//! let raw: Vec<RawObservation> = (0..48)
//!     .map(|t| RawObservation::new(start.offset(t), 100.0 + t as f64))
//!     .collect();
//! let mut pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(&raw, 12)?;
//! println!("{}", report.selection.best_spec());
//! # Ok(())
//! # }
//! ```

pub use demand_facade::*;
