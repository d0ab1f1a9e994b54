//! Demand Facade
//!
//! High-level API for the demand forecasting pipeline. Re-exports the
//! contracts, data model, configuration and stage implementations.

// Re-export everything from API (which includes SPI)
pub use demand_api::*;

// Re-export core modules for direct access
pub use demand_core::{
    decomposition, diagnostics, forecaster, linearity, metrics, pipeline, sarima, selection,
    stationarity, validation,
};

// Re-export implementations at root
pub use demand_core::{
    correlogram, AdditiveDecomposer, AdfStationarityTester, ForecastPipeline, MadSeriesValidator,
    PearsonLinearityAnalyzer, PipelineReport, Projection, SarimaEstimator, SarimaForecaster,
    StepwiseSelector,
};

/// Everything needed to configure and run a pipeline
pub mod prelude {
    pub use demand_api::{
        AdfConfig, AdfRegression, BacktestConfig, Correlogram, DemandError, ForecastResult,
        LinearityConfig, ObservationSeries, Order, OrderBounds, OutlierConfig, PipelineConfig,
        PipelineStage, RawObservation, Result, SearchBudget, SeasonalOrder, SelectionConfig,
        YearMonth,
    };
    pub use demand_api::{
        Decomposer, Forecaster, LinearityAnalyzer, ModelSelector, SeriesValidator,
        StationarityTester,
    };
    pub use demand_core::{ForecastPipeline, PipelineReport};
}
