//! Demand Core
//!
//! Implementations of the demand pipeline stages: series validation,
//! linearity analysis, additive decomposition, ADF stationarity testing,
//! stepwise SARIMA selection and recursive forecasting, plus the
//! stage-gated [`ForecastPipeline`] that ties them together.

pub mod decomposition;
pub mod diagnostics;
pub mod forecaster;
pub mod linearity;
pub mod metrics;
pub mod optim;
pub mod pipeline;
pub mod sarima;
pub mod selection;
pub mod stationarity;
pub mod stats;
pub mod validation;

// Re-export SPI traits for implementations
pub use demand_api::{
    Decomposer, DemandError, Forecaster, LinearityAnalyzer, ModelSelector, Result,
    SeriesValidator, StationarityTester,
};

// Re-export main types
pub use decomposition::AdditiveDecomposer;
pub use diagnostics::correlogram;
pub use forecaster::{Projection, SarimaForecaster};
pub use linearity::PearsonLinearityAnalyzer;
pub use pipeline::{ForecastPipeline, PipelineReport};
pub use sarima::SarimaEstimator;
pub use selection::StepwiseSelector;
pub use stationarity::AdfStationarityTester;
pub use validation::MadSeriesValidator;
