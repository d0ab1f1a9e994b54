//! Demand Service Provider Interface
//!
//! Defines the stage contracts, data model and error taxonomy shared by every
//! crate of the demand forecasting stack.
//!
//! - [`contract`]: one trait per pipeline stage
//! - [`model`]: series, reports, model specifications and forecast results
//! - [`error`]: [`DemandError`] and the [`Result`] alias

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{
    Decomposer, Forecaster, LinearityAnalyzer, ModelSelector, SeriesValidator,
    StationarityTester,
};
pub use error::{DemandError, Result, ValidationErrorKind};
pub use model::{
    AccuracyMetrics, AdfOutcome, AdfRegression, AnnualSummary, CandidateStatus, Coefficients,
    Correlogram, Decomposition, FittedModel, ForecastPoint, ForecastResult, LinearityReport,
    ModelSpec, Observation, ObservationSeries, Order, PipelineStage, RawObservation,
    RejectionReason, Replacement, ReplacementCause, SeasonalOrder, SelectionOutcome, ShortlistEntry,
    StationarityReport, YearMonth,
};
