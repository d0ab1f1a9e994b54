//! Model module containing demand pipeline data structures.
//!
//! - [`YearMonth`] - Calendar month labels
//! - [`ObservationSeries`] - Validated monthly series with its replacement log
//! - [`LinearityReport`], [`Decomposition`], [`StationarityReport`] - Analysis reports
//! - [`Correlogram`] - ACF and PACF for choosing orders by hand
//! - [`ModelSpec`], [`FittedModel`], [`SelectionOutcome`] - Model search results
//! - [`ForecastResult`] - Horizon forecasts and backtest accuracy
//! - [`PipelineStage`] - Orchestrator state

mod correlogram;
mod decomposition;
mod fitted_model;
mod forecast_result;
mod linearity_report;
mod model_spec;
mod observation;
mod period;
mod stage;
mod stationarity_report;

pub use correlogram::Correlogram;
pub use decomposition::Decomposition;
pub use fitted_model::{Coefficients, FittedModel, SelectionOutcome};
pub use forecast_result::{AccuracyMetrics, AnnualSummary, ForecastPoint, ForecastResult};
pub use linearity_report::LinearityReport;
pub use model_spec::{
    CandidateStatus, ModelSpec, Order, RejectionReason, SeasonalOrder, ShortlistEntry,
};
pub use observation::{
    Observation, ObservationSeries, RawObservation, Replacement, ReplacementCause,
};
pub use period::YearMonth;
pub use stage::PipelineStage;
pub use stationarity_report::{AdfOutcome, AdfRegression, StationarityReport};
