//! Stepwise SARIMA order search
//!
//! A local hill-climb over `(p, q, P, Q)` with `d` fixed by the stationarity
//! stage and `D` fixed by a seasonal unit-root check. Each round fits the
//! unvisited neighbours of the current model on the rayon pool, collects the
//! results in candidate order, and moves to the best accepted neighbour only
//! when it ranks strictly better. Ranking is by AIC with BIC as tie-break.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use demand_api::{
    CandidateStatus, DemandError, FittedModel, ModelSelector, ModelSpec, ObservationSeries, Order,
    OrderBounds, PipelineConfig, RejectionReason, Result, SearchBudget, SeasonalOrder,
    SelectionConfig, SelectionOutcome, ShortlistEntry, YearMonth,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::sarima::SarimaEstimator;
use crate::stationarity::seasonal_differencing_order;
use crate::stats;

type CandidateKey = (Order, SeasonalOrder);

/// One fitted (or rejected) candidate
struct Evaluation {
    key: CandidateKey,
    outcome: std::result::Result<FittedModel, RejectionReason>,
}

/// Mutable search bookkeeping for one `select` call
struct SearchState {
    visited: BTreeMap<CandidateKey, Option<RejectionReason>>,
    accepted: BTreeMap<CandidateKey, FittedModel>,
    evaluated: usize,
    truncated: bool,
    deadline: Instant,
}

/// Stepwise auto-SARIMA selector
#[derive(Debug, Clone)]
pub struct StepwiseSelector {
    seasonal_period: usize,
    significance: f64,
    bounds: OrderBounds,
    budget: SearchBudget,
    selection: SelectionConfig,
    estimator: SarimaEstimator,
}

impl StepwiseSelector {
    pub fn new(
        seasonal_period: usize,
        significance: f64,
        bounds: OrderBounds,
        budget: SearchBudget,
        selection: SelectionConfig,
    ) -> Self {
        Self {
            seasonal_period,
            significance,
            bounds,
            budget,
            selection,
            estimator: SarimaEstimator::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.seasonal_period,
            config.significance_threshold,
            config.order_bounds,
            config.search_budget,
            config.selection,
        )
    }

    fn seasonal_enabled(&self) -> bool {
        self.seasonal_period >= 2
    }

    /// Starting candidates, clipped to the bounds and deduplicated
    fn initial_candidates(&self, d: usize, seasonal_d: usize) -> Vec<CandidateKey> {
        let s = self.seasonal_period;
        let seeds = [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)];
        let mut out: Vec<CandidateKey> = Vec::new();
        for (p, q, sp, sq) in seeds {
            let (sp, sq) = if self.seasonal_enabled() { (sp, sq) } else { (0, 0) };
            let key = (
                Order::new(p.min(self.bounds.p_max), d, q.min(self.bounds.q_max)),
                SeasonalOrder::new(
                    sp.min(self.bounds.seasonal_p_max),
                    seasonal_d,
                    sq.min(self.bounds.seasonal_q_max),
                    s,
                ),
            );
            if !out.contains(&key) {
                out.push(key);
            }
        }
        out
    }

    /// Orders one step away from `center` that lie inside the bounds
    fn neighbours(&self, center: CandidateKey) -> Vec<CandidateKey> {
        let (order, seasonal) = center;
        let step = |v: usize, delta: i64| -> Option<usize> {
            let next = v as i64 + delta;
            (next >= 0).then_some(next as usize)
        };

        let mut moves: Vec<(i64, i64, i64, i64)> = vec![
            (1, 0, 0, 0),
            (-1, 0, 0, 0),
            (0, 1, 0, 0),
            (0, -1, 0, 0),
            (1, 1, 0, 0),
            (-1, -1, 0, 0),
        ];
        if self.seasonal_enabled() {
            moves.extend([(0, 0, 1, 0), (0, 0, -1, 0), (0, 0, 0, 1), (0, 0, 0, -1)]);
        }

        moves
            .into_iter()
            .filter_map(|(dp, dq, dsp, dsq)| {
                let candidate = (
                    Order::new(step(order.p, dp)?, order.d, step(order.q, dq)?),
                    SeasonalOrder::new(
                        step(seasonal.p, dsp)?,
                        seasonal.d,
                        step(seasonal.q, dsq)?,
                        seasonal.period,
                    ),
                );
                self.bounds
                    .contains(&candidate.0, &candidate.1)
                    .then_some(candidate)
            })
            .collect()
    }

    fn white_noise_lags(&self, n_eff: usize) -> usize {
        let default = if self.seasonal_enabled() {
            2 * self.seasonal_period
        } else {
            10
        };
        self.selection
            .white_noise_lags
            .unwrap_or(default)
            .min(n_eff / 4)
            .max(1)
    }

    /// Ljung-Box check on the residuals after the conditioning prefix
    fn residual_check(&self, model: &FittedModel) -> Option<RejectionReason> {
        let residuals = model.effective_residuals();
        let scale = 1.0
            + model.training().iter().map(|v| v * v).sum::<f64>() / model.training().len() as f64;
        if stats::variance(residuals) <= 1e-20 * scale {
            return None;
        }
        let spec = model.spec();
        let fitted = spec.order.p + spec.order.q + spec.seasonal_order.p + spec.seasonal_order.q;
        let lags = self.white_noise_lags(residuals.len());
        let (q_statistic, p_value) = stats::ljung_box(residuals, lags, fitted)?;
        (p_value < self.selection.white_noise_significance).then_some(
            RejectionReason::ResidualAutocorrelation {
                q_statistic,
                p_value,
                lags,
            },
        )
    }

    fn evaluate_one(&self, values: &[f64], last_period: YearMonth, key: CandidateKey) -> Evaluation {
        let outcome = self
            .estimator
            .fit(values, last_period, key.0, key.1)
            .and_then(|model| {
                if self.selection.white_noise_significance > 0.0 {
                    if let Some(reason) = self.residual_check(&model) {
                        return Err(reason);
                    }
                }
                Ok(model)
            });
        Evaluation { key, outcome }
    }

    /// Fit a batch of unvisited candidates within the remaining budget
    fn evaluate_batch(
        &self,
        values: &[f64],
        last_period: YearMonth,
        candidates: Vec<CandidateKey>,
        state: &mut SearchState,
    ) -> Vec<CandidateKey> {
        let mut fresh: Vec<CandidateKey> = candidates
            .into_iter()
            .filter(|key| !state.visited.contains_key(key))
            .collect();
        let remaining = self.budget.max_candidates.saturating_sub(state.evaluated);
        if fresh.len() > remaining {
            fresh.truncate(remaining);
            state.truncated = true;
        }
        if fresh.is_empty() {
            return Vec::new();
        }

        let deadline = state.deadline;
        let fit = |key: &CandidateKey| -> Option<Evaluation> {
            if Instant::now() >= deadline {
                return None;
            }
            Some(self.evaluate_one(values, last_period, *key))
        };
        let results: Vec<Option<Evaluation>> = if self.selection.parallel {
            fresh.par_iter().map(fit).collect()
        } else {
            fresh.iter().map(fit).collect()
        };

        let mut accepted = Vec::new();
        for result in results {
            let Some(evaluation) = result else {
                state.truncated = true;
                continue;
            };
            state.evaluated += 1;
            match evaluation.outcome {
                Ok(model) => {
                    debug!(model = %model.spec(), "Candidate accepted");
                    state.visited.insert(evaluation.key, None);
                    state.accepted.insert(evaluation.key, model);
                    accepted.push(evaluation.key);
                }
                Err(reason) => {
                    debug!(
                        order = %evaluation.key.0,
                        seasonal = %evaluation.key.1,
                        %reason,
                        "Candidate rejected"
                    );
                    state.visited.insert(evaluation.key, Some(reason));
                }
            }
        }
        accepted
    }

    fn best_of<'a>(
        state: &'a SearchState,
        keys: impl Iterator<Item = &'a CandidateKey>,
    ) -> Option<&'a FittedModel> {
        keys.filter_map(|key| state.accepted.get(key))
            .min_by(|a, b| a.spec().rank_cmp(b.spec()))
    }

    fn budget_exhausted(&self, state: &SearchState) -> bool {
        state.evaluated >= self.budget.max_candidates || Instant::now() >= state.deadline
    }

    fn into_outcome(state: SearchState) -> Result<SelectionOutcome> {
        let SearchState {
            visited,
            mut accepted,
            evaluated,
            truncated,
            ..
        } = state;

        let best_key = accepted
            .values()
            .min_by(|a, b| a.spec().rank_cmp(b.spec()))
            .map(|m| m.spec().key());
        let Some(best_key) = best_key else {
            let (attempted, reasons): (Vec<CandidateKey>, Vec<RejectionReason>) = visited
                .into_iter()
                .filter_map(|(key, reason)| reason.map(|r| (key, r)))
                .unzip();
            warn!(attempted = attempted.len(), "Every candidate was rejected");
            return Err(DemandError::NoViableModel { attempted, reasons });
        };

        let mut ranked: Vec<ModelSpec> = accepted.values().map(|m| m.spec().clone()).collect();
        ranked.sort_by(|a, b| a.rank_cmp(b));
        let mut shortlist: Vec<ShortlistEntry> = ranked
            .into_iter()
            .map(|spec| ShortlistEntry {
                spec,
                status: CandidateStatus::Accepted,
            })
            .collect();
        shortlist.extend(visited.into_iter().filter_map(|(key, reason)| {
            reason.map(|r| ShortlistEntry {
                spec: ModelSpec::unscored(key.0, key.1),
                status: CandidateStatus::Rejected(r),
            })
        }));

        let best = accepted.remove(&best_key).ok_or_else(|| {
            DemandError::NumericalError("best candidate missing from accepted set".to_string())
        })?;
        info!(
            best = %best.spec(),
            evaluated,
            truncated,
            "Model search finished"
        );
        Ok(SelectionOutcome {
            best,
            shortlist,
            search_truncated: truncated,
            evaluated,
        })
    }
}

impl Default for StepwiseSelector {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl ModelSelector for StepwiseSelector {
    fn select(
        &self,
        series: &ObservationSeries,
        differencing_order: usize,
    ) -> Result<SelectionOutcome> {
        let last_period = series.end().ok_or(DemandError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let values = series.values();
        let differenced = stats::apply_differencing(&values, differencing_order, 0, 1);
        let seasonal_d = if self.seasonal_enabled() {
            seasonal_differencing_order(&differenced, self.seasonal_period, self.significance)
        } else {
            0
        };
        info!(d = differencing_order, seasonal_d, "Starting stepwise model search");

        let mut state = SearchState {
            visited: BTreeMap::new(),
            accepted: BTreeMap::new(),
            evaluated: 0,
            truncated: false,
            deadline: Instant::now() + Duration::from_millis(self.budget.max_wall_clock_ms),
        };

        let initial = self.initial_candidates(differencing_order, seasonal_d);
        let accepted = self.evaluate_batch(&values, last_period, initial, &mut state);
        let first_best = Self::best_of(&state, accepted.iter()).map(|m| m.spec().clone());
        let Some(mut current) = first_best else {
            return Self::into_outcome(state);
        };

        let mut round = 0;
        loop {
            let neighbours: Vec<CandidateKey> = self
                .neighbours(current.key())
                .into_iter()
                .filter(|key| !state.visited.contains_key(key))
                .collect();
            if neighbours.is_empty() {
                break;
            }
            if self.budget_exhausted(&state) {
                state.truncated = true;
                break;
            }
            round += 1;
            let accepted = self.evaluate_batch(&values, last_period, neighbours, &mut state);
            let Some(challenger) = Self::best_of(&state, accepted.iter()) else {
                debug!(round, "No accepted neighbour");
                break;
            };
            if challenger.spec().rank_cmp(&current).is_lt() {
                debug!(round, from = %current.label(), to = %challenger.spec().label(), "Moving");
                current = challenger.spec().clone();
            } else {
                break;
            }
        }
        if state.truncated {
            warn!(evaluated = state.evaluated, "Model search truncated by budget");
        }

        Self::into_outcome(state)
    }

    fn fit_order(
        &self,
        series: &ObservationSeries,
        order: Order,
        seasonal_order: SeasonalOrder,
    ) -> Result<FittedModel> {
        let last_period = series.end().ok_or(DemandError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let values = series.values();
        let model = self
            .estimator
            .fit(&values, last_period, order, seasonal_order)
            .map_err(|reason| DemandError::NoViableModel {
                attempted: vec![(order, seasonal_order)],
                reasons: vec![reason],
            })?;
        if let Some(reason) = self.residual_check(&model) {
            warn!(model = %model.spec(), %reason, "Manual model residuals are not white noise");
        }
        Ok(model)
    }
}
