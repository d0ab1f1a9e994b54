//! Stage-gated demand forecasting pipeline
//!
//! [`ForecastPipeline`] runs the stages in their fixed order and keeps each
//! stage's output. Every stage call checks the current [`PipelineStage`]
//! first; a call out of order, or a stage that fails, leaves the state
//! untouched.

use demand_api::{
    CandidateStatus, Correlogram, Decomposer, Decomposition, DemandError, ForecastResult,
    Forecaster, LinearityAnalyzer, LinearityReport, ModelSelector, ObservationSeries, Order,
    PipelineConfig, PipelineStage, RawObservation, Result, SeasonalOrder, SelectionOutcome,
    SeriesValidator, ShortlistEntry, StationarityReport, StationarityTester,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decomposition::AdditiveDecomposer;
use crate::diagnostics;
use crate::forecaster::SarimaForecaster;
use crate::linearity::PearsonLinearityAnalyzer;
use crate::selection::StepwiseSelector;
use crate::stationarity::AdfStationarityTester;
use crate::validation::MadSeriesValidator;

/// Every stage output of one complete run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub series: ObservationSeries,
    pub linearity: LinearityReport,
    pub decomposition: Decomposition,
    pub stationarity: StationarityReport,
    pub selection: SelectionOutcome,
    pub forecast: ForecastResult,
}

/// Orchestrates the validation, diagnostic, selection and forecast stages.
pub struct ForecastPipeline {
    config: PipelineConfig,
    validator: Box<dyn SeriesValidator>,
    linearity: Box<dyn LinearityAnalyzer>,
    decomposer: Box<dyn Decomposer>,
    stationarity: Box<dyn StationarityTester>,
    selector: Box<dyn ModelSelector>,
    forecaster: Box<dyn Forecaster>,
    stage: PipelineStage,
    series: Option<ObservationSeries>,
    linearity_report: Option<LinearityReport>,
    decomposition: Option<Decomposition>,
    stationarity_report: Option<StationarityReport>,
    selection: Option<SelectionOutcome>,
    forecast: Option<ForecastResult>,
}

impl ForecastPipeline {
    /// Build a pipeline with the default stage implementations.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            validator: Box::new(MadSeriesValidator::from_config(&config)),
            linearity: Box::new(PearsonLinearityAnalyzer::from_config(&config)),
            decomposer: Box::new(AdditiveDecomposer::new()),
            stationarity: Box::new(AdfStationarityTester::from_config(&config)),
            selector: Box::new(StepwiseSelector::from_config(&config)),
            forecaster: Box::new(SarimaForecaster::from_config(&config)),
            config,
            stage: PipelineStage::Idle,
            series: None,
            linearity_report: None,
            decomposition: None,
            stationarity_report: None,
            selection: None,
            forecast: None,
        })
    }

    /// Replace the model selector, e.g. with a narrower search.
    pub fn with_selector(mut self, selector: impl ModelSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Replace the forecaster.
    pub fn with_forecaster(mut self, forecaster: impl Forecaster + 'static) -> Self {
        self.forecaster = Box::new(forecaster);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn series(&self) -> Option<&ObservationSeries> {
        self.series.as_ref()
    }

    pub fn linearity_report(&self) -> Option<&LinearityReport> {
        self.linearity_report.as_ref()
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.decomposition.as_ref()
    }

    pub fn stationarity_report(&self) -> Option<&StationarityReport> {
        self.stationarity_report.as_ref()
    }

    pub fn selection(&self) -> Option<&SelectionOutcome> {
        self.selection.as_ref()
    }

    pub fn forecast_result(&self) -> Option<&ForecastResult> {
        self.forecast.as_ref()
    }

    /// Drop every stage output and return to [`PipelineStage::Idle`].
    pub fn reset(&mut self) {
        self.stage = PipelineStage::Idle;
        self.series = None;
        self.linearity_report = None;
        self.decomposition = None;
        self.stationarity_report = None;
        self.selection = None;
        self.forecast = None;
    }

    fn check(&self, requested: PipelineStage) -> Result<()> {
        if self.stage.can_advance_to(requested) {
            Ok(())
        } else {
            Err(DemandError::InvalidStageTransition {
                current: self.stage,
                requested,
            })
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        debug!(from = %self.stage, to = %stage, "Stage complete");
        self.stage = stage;
    }

    /// Missing stage output that the stage gate promised; unreachable when
    /// the state and outputs move together.
    fn missing(stage: PipelineStage) -> DemandError {
        DemandError::NumericalError(format!("output of stage {} is missing", stage))
    }

    fn validated_series(&self) -> Result<&ObservationSeries> {
        self.series
            .as_ref()
            .ok_or_else(|| Self::missing(PipelineStage::Validated))
    }

    pub fn validate(&mut self, raw: &[RawObservation]) -> Result<&ObservationSeries> {
        self.check(PipelineStage::Validated)?;
        let series = self.validator.validate(raw)?;
        info!(
            observations = series.len(),
            replacements = series.replacements().len(),
            "Series validated"
        );
        self.advance(PipelineStage::Validated);
        Ok(self.series.insert(series))
    }

    pub fn analyze_linearity(&mut self) -> Result<&LinearityReport> {
        self.check(PipelineStage::LinearityDone)?;
        let values = self.validated_series()?.values();
        let report = self.linearity.analyze(&values)?;
        self.advance(PipelineStage::LinearityDone);
        Ok(self.linearity_report.insert(report))
    }

    pub fn decompose(&mut self) -> Result<&Decomposition> {
        self.check(PipelineStage::Decomposed)?;
        let values = self.validated_series()?.values();
        let decomposition = self
            .decomposer
            .decompose(&values, self.config.seasonal_period)?;
        self.advance(PipelineStage::Decomposed);
        Ok(self.decomposition.insert(decomposition))
    }

    pub fn test_stationarity(&mut self) -> Result<&StationarityReport> {
        self.check(PipelineStage::StationarityDone)?;
        let values = self.validated_series()?.values();
        let report = self.stationarity.test(&values)?;
        self.advance(PipelineStage::StationarityDone);
        Ok(self.stationarity_report.insert(report))
    }

    /// ACF and PACF of the differenced series, for choosing the orders
    /// passed to [`ForecastPipeline::select_manual`]. Available once the
    /// stationarity test has run; does not change the stage.
    pub fn correlogram(&self, max_lag: usize) -> Result<Correlogram> {
        let report = self
            .stationarity_report
            .as_ref()
            .ok_or(DemandError::InvalidStageTransition {
                current: self.stage,
                requested: PipelineStage::StationarityDone,
            })?;
        diagnostics::correlogram(&report.differenced, max_lag)
    }

    /// Stepwise search with `d` taken from the stationarity report.
    pub fn select_model(&mut self) -> Result<&SelectionOutcome> {
        self.check(PipelineStage::ModelSelected)?;
        let differencing_order = self
            .stationarity_report
            .as_ref()
            .map(|r| r.differencing_order)
            .ok_or_else(|| Self::missing(PipelineStage::StationarityDone))?;
        let outcome = self
            .selector
            .select(self.validated_series()?, differencing_order)?;
        info!(
            best = %outcome.best_spec(),
            evaluated = outcome.evaluated,
            truncated = outcome.search_truncated,
            "Model selected"
        );
        self.advance(PipelineStage::ModelSelected);
        Ok(self.selection.insert(outcome))
    }

    /// Fit a caller-chosen order instead of searching.
    pub fn select_manual(
        &mut self,
        order: Order,
        seasonal_order: SeasonalOrder,
    ) -> Result<&SelectionOutcome> {
        self.check(PipelineStage::ModelSelected)?;
        let model = self
            .selector
            .fit_order(self.validated_series()?, order, seasonal_order)?;
        let entry = ShortlistEntry {
            spec: model.spec().clone(),
            status: CandidateStatus::Accepted,
        };
        info!(model = %model.spec(), "Manual model fitted");
        self.advance(PipelineStage::ModelSelected);
        Ok(self.selection.insert(SelectionOutcome {
            best: model,
            shortlist: vec![entry],
            search_truncated: false,
            evaluated: 1,
        }))
    }

    /// Forecast `horizon` months at the configured confidence level.
    pub fn forecast(&mut self, horizon: usize) -> Result<&ForecastResult> {
        self.check(PipelineStage::Forecasted)?;
        let model = self
            .selection
            .as_ref()
            .map(|s| &s.best)
            .ok_or_else(|| Self::missing(PipelineStage::ModelSelected))?;
        let result = self
            .forecaster
            .forecast(model, horizon, self.config.confidence_level)?;
        self.advance(PipelineStage::Forecasted);
        Ok(self.forecast.insert(result))
    }

    /// Reset, then run every stage with the automatic model search.
    pub fn run(&mut self, raw: &[RawObservation], horizon: usize) -> Result<PipelineReport> {
        self.reset();
        let series = self.validate(raw)?.clone();
        let linearity = self.analyze_linearity()?.clone();
        let decomposition = self.decompose()?.clone();
        let stationarity = self.test_stationarity()?.clone();
        let selection = self.select_model()?.clone();
        let forecast = self.forecast(horizon)?.clone();
        Ok(PipelineReport {
            series,
            linearity,
            decomposition,
            stationarity,
            selection,
            forecast,
        })
    }
}

impl std::fmt::Debug for ForecastPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastPipeline")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demand_api::{OrderBounds, SearchBudget, YearMonth};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn raw_seasonal(n: usize) -> Vec<RawObservation> {
        let start = YearMonth::new(2018, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let noise = Normal::new(0.0, 8.0).unwrap();
        (0..n)
            .map(|t| {
                let tf = t as f64;
                let value = 300.0
                    + 4.0 * tf
                    + 80.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
                    + noise.sample(&mut rng);
                RawObservation::new(start.offset(t as i64), value)
            })
            .collect()
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig::default()
            .order_bounds(OrderBounds::uniform(1))
            .search_budget(SearchBudget {
                max_candidates: 16,
                max_wall_clock_ms: 600_000,
            })
    }

    // ===== Construction =====

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = ForecastPipeline::new(PipelineConfig::default().seasonal_period(1)).unwrap_err();
        assert!(matches!(err, DemandError::InvalidParameter { .. }));
    }

    #[test]
    fn test_starts_idle() {
        let pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        assert!(pipeline.series().is_none());
    }

    // ===== Gating =====

    #[test]
    fn test_out_of_order_call_is_rejected() {
        let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
        let err = pipeline.forecast(12).unwrap_err();
        assert_eq!(
            err,
            DemandError::InvalidStageTransition {
                current: PipelineStage::Idle,
                requested: PipelineStage::Forecasted,
            }
        );
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
    }

    #[test]
    fn test_stage_cannot_repeat() {
        let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.validate(&raw_seasonal(48)).unwrap();
        let err = pipeline.validate(&raw_seasonal(48)).unwrap_err();
        assert!(matches!(err, DemandError::InvalidStageTransition { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Validated);
    }

    #[test]
    fn test_failed_stage_keeps_state() {
        let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
        let err = pipeline.validate(&raw_seasonal(10)).unwrap_err();
        assert!(matches!(err, DemandError::Validation { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Idle);

        let start = YearMonth::new(2018, 1).unwrap();
        let constant: Vec<RawObservation> = (0..36)
            .map(|t| RawObservation::new(start.offset(t), 42.0))
            .collect();
        pipeline.validate(&constant).unwrap();
        let err = pipeline.analyze_linearity().unwrap_err();
        assert!(matches!(err, DemandError::DegenerateSeries { .. }));
        assert_eq!(pipeline.stage(), PipelineStage::Validated);
        assert!(pipeline.linearity_report().is_none());
    }

    #[test]
    fn test_stages_advance_one_at_a_time() {
        let mut pipeline = ForecastPipeline::new(quick_config()).unwrap();
        pipeline.validate(&raw_seasonal(60)).unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::Validated);
        pipeline.analyze_linearity().unwrap();
        assert_eq!(pipeline.stage(), PipelineStage::LinearityDone);
        let decomposition = pipeline.decompose().unwrap();
        assert_eq!(decomposition.period, 12);
        assert_eq!(pipeline.stage(), PipelineStage::Decomposed);
    }

    #[test]
    fn test_reset_clears_outputs() {
        let mut pipeline = ForecastPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.validate(&raw_seasonal(48)).unwrap();
        pipeline.reset();
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        assert!(pipeline.series().is_none());
        pipeline.validate(&raw_seasonal(48)).unwrap();
    }

    // ===== Manual selection =====

    #[test]
    fn test_correlogram_of_differenced_series() {
        let mut pipeline = ForecastPipeline::new(quick_config()).unwrap();
        pipeline.validate(&raw_seasonal(48)).unwrap();
        assert!(matches!(
            pipeline.correlogram(12),
            Err(DemandError::InvalidStageTransition {
                current: PipelineStage::Validated,
                requested: PipelineStage::StationarityDone,
            })
        ));

        pipeline.analyze_linearity().unwrap();
        pipeline.decompose().unwrap();
        let differenced_len = pipeline.test_stationarity().unwrap().differenced.len();

        let correlogram = pipeline.correlogram(12).unwrap();
        assert_eq!(correlogram.max_lag(), 12);
        assert_eq!(correlogram.pacf.len(), 12);
        assert_eq!(correlogram.n_obs, differenced_len);
        assert!(correlogram.acf.iter().all(|r| r.abs() <= 1.0 + 1e-12));
        assert_eq!(pipeline.stage(), PipelineStage::StationarityDone);
    }

    #[test]
    fn test_manual_selection_and_forecast() {
        let mut pipeline = ForecastPipeline::new(quick_config()).unwrap();
        pipeline.validate(&raw_seasonal(48)).unwrap();
        pipeline.analyze_linearity().unwrap();
        pipeline.decompose().unwrap();
        pipeline.test_stationarity().unwrap();

        let outcome = pipeline
            .select_manual(Order::new(0, 1, 0), SeasonalOrder::new(0, 1, 0, 12))
            .unwrap();
        assert_eq!(outcome.shortlist.len(), 1);
        assert!(outcome.shortlist[0].is_accepted());
        assert_eq!(pipeline.stage(), PipelineStage::ModelSelected);

        let result = pipeline.forecast(12).unwrap();
        assert_eq!(result.horizon(), 12);
        assert_eq!(
            result.horizon_points[0].period,
            YearMonth::new(2022, 1).unwrap()
        );
        assert_eq!(pipeline.stage(), PipelineStage::Forecasted);
    }
}
