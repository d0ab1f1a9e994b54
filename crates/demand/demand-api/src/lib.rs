//! Demand Consumer API
//!
//! Configuration types for demand pipeline consumers. Every struct is
//! serde-serializable with defaults for missing fields, so a partial JSON
//! document is a valid configuration.

use serde::{Deserialize, Serialize};

// Re-export SPI types
pub use demand_spi::{
    AccuracyMetrics, AdfOutcome, AdfRegression, AnnualSummary, CandidateStatus, Coefficients,
    Correlogram, Decomposer, Decomposition, DemandError, FittedModel, ForecastPoint, ForecastResult,
    Forecaster, LinearityAnalyzer, LinearityReport, ModelSelector, ModelSpec, Observation,
    ObservationSeries, Order, PipelineStage, RawObservation, RejectionReason, Replacement,
    ReplacementCause, Result, SeasonalOrder, SelectionOutcome, SeriesValidator, ShortlistEntry,
    StationarityReport, StationarityTester, ValidationErrorKind, YearMonth,
};

/// Outlier screening and gap handling for the validator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutlierConfig {
    /// Replace outliers when true; otherwise leave values untouched
    pub enabled: bool,
    /// Points further than this many scaled MADs from the median are outliers
    pub mad_multiplier: f64,
    /// Interpolate missing months instead of failing
    pub fill_gaps: bool,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mad_multiplier: 3.0,
            fill_gaps: true,
        }
    }
}

impl OutlierConfig {
    /// Configuration with outlier replacement switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the MAD multiplier
    pub fn mad_multiplier(mut self, multiplier: f64) -> Self {
        self.mad_multiplier = multiplier;
        self
    }

    /// Enable or disable gap filling
    pub fn fill_gaps(mut self, fill: bool) -> Self {
        self.fill_gaps = fill;
        self
    }
}

/// Classification thresholds for the linearity check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinearityConfig {
    /// Minimum absolute correlation for a linear classification
    pub min_abs_correlation: f64,
    /// p-value must be strictly below this
    pub significance: f64,
}

impl Default for LinearityConfig {
    fn default() -> Self {
        Self {
            min_abs_correlation: 0.7,
            significance: 0.05,
        }
    }
}

/// Augmented Dickey-Fuller regression settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AdfConfig {
    /// Deterministic terms in the test regression
    pub regression: AdfRegression,
    /// Fixed number of lagged differences; `None` uses `floor((n-1)^(1/3))`
    pub lags: Option<usize>,
}

/// Upper bounds of the order search
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrderBounds {
    pub p_max: usize,
    pub q_max: usize,
    pub seasonal_p_max: usize,
    pub seasonal_q_max: usize,
}

impl Default for OrderBounds {
    fn default() -> Self {
        Self {
            p_max: 3,
            q_max: 3,
            seasonal_p_max: 3,
            seasonal_q_max: 3,
        }
    }
}

impl OrderBounds {
    /// The same bound for every order
    pub fn uniform(max: usize) -> Self {
        Self {
            p_max: max,
            q_max: max,
            seasonal_p_max: max,
            seasonal_q_max: max,
        }
    }

    /// Whether an order lies inside the bounds
    pub fn contains(&self, order: &Order, seasonal: &SeasonalOrder) -> bool {
        order.p <= self.p_max
            && order.q <= self.q_max
            && seasonal.p <= self.seasonal_p_max
            && seasonal.q <= self.seasonal_q_max
    }
}

/// Limits that keep the model search from running unbounded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchBudget {
    /// Maximum number of candidate fits
    pub max_candidates: usize,
    /// Wall-clock limit for the whole search, in milliseconds
    pub max_wall_clock_ms: u64,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_candidates: 64,
            max_wall_clock_ms: 30_000,
        }
    }
}

/// Candidate acceptance and execution settings for the model search
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    /// Ljung-Box p-values below this reject a candidate; 0 disables the check
    pub white_noise_significance: f64,
    /// Fixed Ljung-Box lag count; `None` derives it from the series
    pub white_noise_lags: Option<usize>,
    /// Fit the candidates of each search round on the rayon pool
    pub parallel: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            white_noise_significance: 0.01,
            white_noise_lags: None,
            parallel: true,
        }
    }
}

/// Holdout backtest settings for the forecaster
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct BacktestConfig {
    /// Held-out periods; `None` uses `min(12, n / 5)`
    pub holdout: Option<usize>,
}

/// Configuration recognised by every pipeline stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seasonal period in months
    pub seasonal_period: usize,
    /// Unit-root test significance
    pub significance_threshold: f64,
    /// Largest non-seasonal differencing order tried
    pub max_differencing: usize,
    pub order_bounds: OrderBounds,
    pub search_budget: SearchBudget,
    /// Prediction interval coverage
    pub confidence_level: f64,
    pub outlier: OutlierConfig,
    pub linearity: LinearityConfig,
    pub adf: AdfConfig,
    pub selection: SelectionConfig,
    pub backtest: BacktestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seasonal_period: 12,
            significance_threshold: 0.05,
            max_differencing: 2,
            order_bounds: OrderBounds::default(),
            search_budget: SearchBudget::default(),
            confidence_level: 0.95,
            outlier: OutlierConfig::default(),
            linearity: LinearityConfig::default(),
            adf: AdfConfig::default(),
            selection: SelectionConfig::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the seasonal period
    pub fn seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Set the unit-root significance threshold
    pub fn significance_threshold(mut self, threshold: f64) -> Self {
        self.significance_threshold = threshold;
        self
    }

    /// Set the maximum differencing order
    pub fn max_differencing(mut self, max: usize) -> Self {
        self.max_differencing = max;
        self
    }

    /// Set the order search bounds
    pub fn order_bounds(mut self, bounds: OrderBounds) -> Self {
        self.order_bounds = bounds;
        self
    }

    /// Set the search budget
    pub fn search_budget(mut self, budget: SearchBudget) -> Self {
        self.search_budget = budget;
        self
    }

    /// Set the prediction interval coverage
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the outlier configuration
    pub fn outlier(mut self, outlier: OutlierConfig) -> Self {
        self.outlier = outlier;
        self
    }

    /// Set the linearity thresholds
    pub fn linearity(mut self, linearity: LinearityConfig) -> Self {
        self.linearity = linearity;
        self
    }

    /// Set the ADF regression settings
    pub fn adf(mut self, adf: AdfConfig) -> Self {
        self.adf = adf;
        self
    }

    /// Set the selection settings
    pub fn selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Set the backtest settings
    pub fn backtest(mut self, backtest: BacktestConfig) -> Self {
        self.backtest = backtest;
        self
    }

    /// Shortest series accepted by the validator: two full seasonal cycles,
    /// and never fewer than 24 months
    pub fn min_series_length(&self) -> usize {
        (2 * self.seasonal_period).max(24)
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<()> {
        if self.seasonal_period < 2 {
            return Err(DemandError::invalid_parameter(
                "seasonal_period",
                "must be at least 2",
            ));
        }
        check_open_unit("significance_threshold", self.significance_threshold)?;
        check_open_unit("confidence_level", self.confidence_level)?;
        check_open_unit("linearity.significance", self.linearity.significance)?;
        if self.max_differencing > 2 {
            return Err(DemandError::invalid_parameter(
                "max_differencing",
                "must be at most 2",
            ));
        }
        if !(self.outlier.mad_multiplier.is_finite() && self.outlier.mad_multiplier > 0.0) {
            return Err(DemandError::invalid_parameter(
                "outlier.mad_multiplier",
                "must be a positive number",
            ));
        }
        if !(0.0..=1.0).contains(&self.linearity.min_abs_correlation) {
            return Err(DemandError::invalid_parameter(
                "linearity.min_abs_correlation",
                "must be in [0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.selection.white_noise_significance) {
            return Err(DemandError::invalid_parameter(
                "selection.white_noise_significance",
                "must be in [0, 1)",
            ));
        }
        if self.selection.white_noise_lags == Some(0) {
            return Err(DemandError::invalid_parameter(
                "selection.white_noise_lags",
                "must be positive",
            ));
        }
        if self.search_budget.max_candidates == 0 {
            return Err(DemandError::invalid_parameter(
                "search_budget.max_candidates",
                "must be positive",
            ));
        }
        if self.backtest.holdout == Some(0) {
            return Err(DemandError::invalid_parameter(
                "backtest.holdout",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)
            .map_err(|e| DemandError::invalid_parameter("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DemandError::invalid_parameter("config", e.to_string()))
    }
}

fn check_open_unit(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(DemandError::invalid_parameter(name, "must be in (0, 1)"))
    }
}
