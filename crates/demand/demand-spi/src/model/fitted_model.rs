//! Fitted model and model search outcome.

use serde::{Deserialize, Serialize};

use super::{ModelSpec, ShortlistEntry, YearMonth};

/// Estimated SARIMA coefficients, sign convention
/// `φ(B)Φ(B^s)(w_t - μ) = θ(B)Θ(B^s)e_t` with
/// `φ(B) = 1 - Σφ_i B^i` and `θ(B) = 1 + Σθ_j B^j`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coefficients {
    /// Mean `μ` of the differenced series.
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Coefficients with every term zero except the intercept.
    pub fn mean_only(intercept: f64) -> Self {
        Self {
            intercept,
            ..Default::default()
        }
    }
}

/// A model fitted to one training series. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    spec: ModelSpec,
    coefficients: Coefficients,
    residuals: Vec<f64>,
    conditioning: usize,
    training: Vec<f64>,
    last_period: YearMonth,
}

impl FittedModel {
    /// Assemble a fitted model.
    ///
    /// `residuals` are aligned to the differenced series; the first
    /// `conditioning` entries are the zero residuals assumed by the
    /// conditional likelihood.
    pub fn new(
        spec: ModelSpec,
        coefficients: Coefficients,
        residuals: Vec<f64>,
        conditioning: usize,
        training: Vec<f64>,
        last_period: YearMonth,
    ) -> Self {
        Self {
            spec,
            coefficients,
            residuals,
            conditioning,
            training,
            last_period,
        }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Residuals aligned to the differenced series.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Residuals after the conditioning prefix.
    pub fn effective_residuals(&self) -> &[f64] {
        &self.residuals[self.conditioning.min(self.residuals.len())..]
    }

    pub fn conditioning(&self) -> usize {
        self.conditioning
    }

    /// Observed values the model was fitted to, on the original scale.
    pub fn training(&self) -> &[f64] {
        &self.training
    }

    /// Period of the last training observation.
    pub fn last_period(&self) -> YearMonth {
        self.last_period
    }

    pub fn sigma2(&self) -> f64 {
        self.spec.sigma2
    }

    /// Give up the model, keeping only its specification.
    pub fn into_spec(self) -> ModelSpec {
        self.spec
    }
}

/// Result of a model search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    /// Lowest-ranked accepted candidate.
    pub best: FittedModel,
    /// Accepted candidates in rank order, followed by rejected ones.
    pub shortlist: Vec<ShortlistEntry>,
    /// The search stopped early on its candidate or time budget.
    pub search_truncated: bool,
    /// Candidates fitted.
    pub evaluated: usize,
}

impl SelectionOutcome {
    pub fn best_spec(&self) -> &ModelSpec {
        self.best.spec()
    }

    pub fn accepted(&self) -> impl Iterator<Item = &ShortlistEntry> {
        self.shortlist.iter().filter(|e| e.is_accepted())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ShortlistEntry> {
        self.shortlist.iter().filter(|e| !e.is_accepted())
    }
}
