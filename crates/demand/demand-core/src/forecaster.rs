//! Recursive SARIMA forecasting with prediction intervals
//!
//! Point forecasts run the ARMA recursion on the differenced scale, with
//! future shocks set to zero, and are integrated back through the expanded
//! differencing polynomial. Interval widths come from the ψ-weights of the
//! full AR polynomial including differencing, so the forecast-error
//! variance `σ² Σ ψ_j²` never shrinks with the horizon.

use demand_api::{
    AccuracyMetrics, BacktestConfig, DemandError, FittedModel, ForecastPoint, ForecastResult,
    Forecaster, PipelineConfig, Result,
};
use tracing::{debug, info, warn};

use crate::metrics;
use crate::sarima::{expand_ar, expand_ma, SarimaEstimator};
use crate::stats;

/// Point forecasts and their standard errors
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub points: Vec<f64>,
    pub std_errors: Vec<f64>,
}

/// Forecaster for models produced by [`SarimaEstimator`]
#[derive(Debug, Clone, Default)]
pub struct SarimaForecaster {
    backtest: BacktestConfig,
    estimator: SarimaEstimator,
}

impl SarimaForecaster {
    pub fn new(backtest: BacktestConfig) -> Self {
        Self {
            backtest,
            estimator: SarimaEstimator::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.backtest)
    }

    /// Holdout length used for a training series of `n` observations
    pub fn holdout_len(&self, n: usize) -> usize {
        self.backtest.holdout.unwrap_or_else(|| (n / 5).min(12))
    }

    /// Forecast `horizon` steps past the end of the model's training data.
    pub fn project(&self, model: &FittedModel, horizon: usize) -> Result<Projection> {
        let spec = model.spec();
        let order = spec.order;
        let seasonal = spec.seasonal_order;
        let period = seasonal.period;
        let training = model.training();
        let lost = order.d + period * seasonal.d;
        if training.len() <= lost {
            return Err(DemandError::InsufficientData {
                required: lost + 1,
                actual: training.len(),
            });
        }
        if !(model.sigma2().is_finite() && model.sigma2() >= 0.0) {
            return Err(DemandError::NumericalError(format!(
                "innovation variance {} is not usable",
                model.sigma2()
            )));
        }

        let coefficients = model.coefficients();
        let mu = coefficients.intercept;
        let ar = expand_ar(&coefficients.ar, &coefficients.seasonal_ar, period);
        let ma = expand_ma(&coefficients.ma, &coefficients.seasonal_ma, period);

        let w = stats::apply_differencing(training, order.d, seasonal.d, period);
        let n_w = w.len();
        let mut x: Vec<f64> = w.iter().map(|v| v - mu).collect();
        let residuals = model.residuals();
        let shock = |t: usize| -> f64 {
            if t < n_w {
                residuals.get(t).copied().unwrap_or(0.0)
            } else {
                0.0
            }
        };

        for t in n_w..n_w + horizon {
            let mut next = 0.0;
            for (i, a) in ar.iter().enumerate() {
                if t > i {
                    next += a * x[t - i - 1];
                }
            }
            for (j, b) in ma.iter().enumerate() {
                if t > j {
                    next += b * shock(t - j - 1);
                }
            }
            x.push(next);
        }

        let delta = stats::integration_weights(order.d, seasonal.d, period);
        let mut y = training.to_vec();
        let n = training.len();
        for h in 0..horizon {
            let t = n + h;
            let mut value = x[n_w + h] + mu;
            for (i, d) in delta.iter().enumerate().skip(1) {
                value += d * y[t - i];
            }
            y.push(value);
        }

        let psi = psi_weights(&ar, &ma, &delta, horizon);
        let sigma2 = model.sigma2();
        let mut cumulative = 0.0;
        let std_errors = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (sigma2 * cumulative).sqrt()
            })
            .collect();

        Ok(Projection {
            points: y.split_off(n),
            std_errors,
        })
    }

    /// Refit the model's orders on all but the last periods and score the
    /// forecast of the held-out window. Failures yield unavailable metrics.
    pub fn backtest(&self, model: &FittedModel) -> AccuracyMetrics {
        let training = model.training();
        let n = training.len();
        let holdout = self.holdout_len(n);
        if holdout == 0 || holdout >= n {
            warn!(n, holdout, "Series too short for a backtest");
            return AccuracyMetrics::unavailable();
        }

        let spec = model.spec();
        let (head, actual) = training.split_at(n - holdout);
        let head_end = model.last_period().offset(-(holdout as i64));
        let refit = match self
            .estimator
            .fit(head, head_end, spec.order, spec.seasonal_order)
        {
            Ok(refit) => refit,
            Err(reason) => {
                warn!(model = %spec, holdout, %reason, "Backtest refit failed");
                return AccuracyMetrics::unavailable();
            }
        };

        match self.project(&refit, holdout) {
            Ok(projection) => {
                let m = metrics::accuracy(actual, &projection.points);
                debug!(holdout, mae = m.mae, rmse = m.rmse, mape = m.mape, "Backtest scored");
                m
            }
            Err(e) => {
                warn!(model = %spec, error = %e, "Backtest forecast failed");
                AccuracyMetrics::unavailable()
            }
        }
    }
}

/// ψ-weights `ψ_0..ψ_{horizon-1}` of `θ(B) / (φ(B)(1-B)^d(1-B^s)^D)`
fn psi_weights(ar: &[f64], ma: &[f64], delta: &[f64], horizon: usize) -> Vec<f64> {
    let mut ar_poly = vec![1.0];
    ar_poly.extend(ar.iter().map(|a| -a));
    let mut diff_poly = vec![1.0];
    diff_poly.extend(delta.iter().skip(1).map(|d| -d));
    let alpha: Vec<f64> = stats::poly_mul(&ar_poly, &diff_poly)
        .iter()
        .skip(1)
        .map(|c| -c)
        .collect();

    let mut psi = Vec::with_capacity(horizon);
    for j in 0..horizon {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for (i, a) in alpha.iter().enumerate().take(j) {
            value += a * psi[j - i - 1];
        }
        psi.push(value);
    }
    psi
}

impl Forecaster for SarimaForecaster {
    fn forecast(
        &self,
        model: &FittedModel,
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(DemandError::invalid_parameter(
                "horizon",
                "must be at least one period",
            ));
        }
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(DemandError::invalid_parameter(
                "confidence_level",
                "must lie strictly between 0 and 1",
            ));
        }
        let z = stats::z_score(confidence_level).ok_or_else(|| {
            DemandError::NumericalError("normal quantile unavailable".to_string())
        })?;

        let projection = self.project(model, horizon)?;
        let last = model.last_period();
        let horizon_points = projection
            .points
            .iter()
            .zip(projection.std_errors.iter())
            .enumerate()
            .map(|(h, (&point, &se))| ForecastPoint {
                period: last.offset(h as i64 + 1),
                point_forecast: point,
                lower_bound: point - z * se,
                upper_bound: point + z * se,
                std_error: se,
            })
            .collect();

        let metrics = self.backtest(model);
        info!(
            model = %model.spec(),
            horizon,
            confidence_level,
            backtest_holdout = metrics.holdout,
            "Forecast produced"
        );

        Ok(ForecastResult {
            spec: model.spec().clone(),
            horizon_points,
            metrics,
            confidence_level,
        })
    }
}
