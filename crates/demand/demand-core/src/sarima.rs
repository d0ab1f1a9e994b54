//! Seasonal ARIMA estimation by conditional sum of squares
//!
//! The model is fitted to `w = (1-B)^d (1-B^s)^D y` centred on its mean:
//!
//! ```text
//! φ(B) Φ(B^s) (w_t - μ) = θ(B) Θ(B^s) e_t
//! ```
//!
//! The intercept `μ` is the sample mean of `w`; the remaining coefficients
//! minimise the conditional sum of squares with Nelder-Mead, starting the
//! residual recursion after the `p + sP` observations the AR part needs.

use demand_api::{
    Coefficients, FittedModel, ModelSpec, Order, RejectionReason, SeasonalOrder, YearMonth,
};
use tracing::trace;

use crate::optim::{nelder_mead, NelderMeadConfig};
use crate::stats;

/// Reflection coefficients at or above this magnitude reject a fit
pub const ROOT_LIMIT: f64 = 0.999;

/// `a_i` with `φ(B)Φ(B^s) = 1 - Σ a_i B^i`; index 0 is lag 1
pub fn expand_ar(nonseasonal: &[f64], seasonal: &[f64], period: usize) -> Vec<f64> {
    let product = stats::poly_mul(
        &lag_polynomial(nonseasonal, 1, -1.0),
        &lag_polynomial(seasonal, period, -1.0),
    );
    product.iter().skip(1).map(|c| -c).collect()
}

/// `b_j` with `θ(B)Θ(B^s) = 1 + Σ b_j B^j`; index 0 is lag 1
pub fn expand_ma(nonseasonal: &[f64], seasonal: &[f64], period: usize) -> Vec<f64> {
    let product = stats::poly_mul(
        &lag_polynomial(nonseasonal, 1, 1.0),
        &lag_polynomial(seasonal, period, 1.0),
    );
    product.into_iter().skip(1).collect()
}

fn lag_polynomial(coeffs: &[f64], spacing: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * spacing + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * spacing] = sign * c;
    }
    poly
}

/// Conditional residuals of a centred series; zeros before `start`
pub fn css_residuals(centred: &[f64], ar: &[f64], ma: &[f64], start: usize) -> Vec<f64> {
    let n = centred.len();
    let mut residuals = vec![0.0; n];
    for t in start..n {
        let mut e = centred[t];
        for (i, a) in ar.iter().enumerate() {
            if t > i {
                e -= a * centred[t - i - 1];
            }
        }
        for (j, b) in ma.iter().enumerate() {
            if t > j {
                e -= b * residuals[t - j - 1];
            }
        }
        residuals[t] = e;
    }
    residuals
}

/// Parameter vector layout `[φ.., θ.., Φ.., Θ..]`
struct Layout {
    p: usize,
    q: usize,
    sp: usize,
    sq: usize,
}

impl Layout {
    fn dim(&self) -> usize {
        self.p + self.q + self.sp + self.sq
    }

    fn split<'a>(&self, x: &'a [f64]) -> (&'a [f64], &'a [f64], &'a [f64], &'a [f64]) {
        let (ar, rest) = x.split_at(self.p);
        let (ma, rest) = rest.split_at(self.q);
        let (sar, sma) = rest.split_at(self.sp);
        (ar, ma, sar, sma)
    }
}

fn negated(coeffs: &[f64]) -> Vec<f64> {
    coeffs.iter().map(|c| -c).collect()
}

/// Largest reflection magnitudes of the AR and MA factors
fn root_margins(ar: &[f64], ma: &[f64], sar: &[f64], sma: &[f64]) -> (f64, f64) {
    let ar_margin = stats::max_reflection(ar).max(stats::max_reflection(sar));
    let ma_margin = stats::max_reflection(&negated(ma)).max(stats::max_reflection(&negated(sma)));
    (ar_margin, ma_margin)
}

/// CSS estimator for SARIMA candidates
#[derive(Debug, Clone, Default)]
pub struct SarimaEstimator;

impl SarimaEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Fit one candidate order to `values` on the original scale.
    ///
    /// Failures are reported as the reason the candidate is rejected.
    pub fn fit(
        &self,
        values: &[f64],
        last_period: YearMonth,
        order: Order,
        seasonal_order: SeasonalOrder,
    ) -> std::result::Result<FittedModel, RejectionReason> {
        let period = seasonal_order.period;
        let has_seasonal_terms =
            seasonal_order.p + seasonal_order.d + seasonal_order.q > 0;
        if has_seasonal_terms && period < 2 {
            return Err(RejectionReason::NumericalFailure(
                "seasonal terms need a period of at least 2".to_string(),
            ));
        }

        let layout = Layout {
            p: order.p,
            q: order.q,
            sp: seasonal_order.p,
            sq: seasonal_order.q,
        };
        let parameter_count = layout.dim() + 1;

        let w = stats::apply_differencing(values, order.d, seasonal_order.d, period);
        let conditioning = order.p + period * seasonal_order.p;
        let n_eff = w.len().saturating_sub(conditioning);
        let required = 2 * parameter_count + 8;
        if n_eff < required {
            return Err(RejectionReason::InsufficientData {
                required: required + conditioning + values.len() - w.len(),
                actual: values.len(),
            });
        }

        let mu = stats::mean(&w);
        let centred: Vec<f64> = w.iter().map(|v| v - mu).collect();
        let floor = f64::EPSILON * (1.0 + w.iter().map(|v| v * v).sum::<f64>() / w.len() as f64);

        let objective = |x: &[f64]| -> f64 {
            let (ar, ma, sar, sma) = layout.split(x);
            let (ar_margin, ma_margin) = root_margins(ar, ma, sar, sma);
            if ar_margin >= 1.0 || ma_margin >= 1.0 {
                return f64::INFINITY;
            }
            let full_ar = expand_ar(ar, sar, period);
            let full_ma = expand_ma(ma, sma, period);
            let residuals = css_residuals(&centred, &full_ar, &full_ma, conditioning);
            let css: f64 = residuals[conditioning..].iter().map(|e| e * e).sum();
            (css / n_eff as f64).max(floor)
        };

        let dim = layout.dim();
        let params = if dim == 0 {
            Vec::new()
        } else {
            let start = initial_guess(&centred, &layout, period);
            let config = NelderMeadConfig::for_dimension(dim);
            let first = nelder_mead(&objective, &start, &config);
            let second = nelder_mead(&objective, &first.optimal_point, &config);
            let evaluations = first.evaluations + second.evaluations;
            let converged = second.converged;
            let best = if second.optimal_value <= first.optimal_value {
                second
            } else {
                first
            };
            if !best.optimal_value.is_finite() {
                return Err(RejectionReason::NumericalFailure(
                    "objective is not finite at the optimum".to_string(),
                ));
            }
            if !converged {
                return Err(RejectionReason::DidNotConverge {
                    iterations: evaluations,
                });
            }
            trace!(%order, %seasonal_order, evaluations, "CSS optimum found");
            best.optimal_point
        };

        let (ar, ma, sar, sma) = layout.split(&params);
        let (ar_margin, ma_margin) = root_margins(ar, ma, sar, sma);
        if ar_margin >= ROOT_LIMIT {
            return Err(RejectionReason::NonStationaryAr);
        }
        if ma_margin >= ROOT_LIMIT {
            return Err(RejectionReason::NonInvertibleMa);
        }

        let full_ar = expand_ar(ar, sar, period);
        let full_ma = expand_ma(ma, sma, period);
        let residuals = css_residuals(&centred, &full_ar, &full_ma, conditioning);
        let css: f64 = residuals[conditioning..].iter().map(|e| e * e).sum();
        if !css.is_finite() {
            return Err(RejectionReason::NumericalFailure(
                "residual sum of squares is not finite".to_string(),
            ));
        }

        let nf = n_eff as f64;
        let sigma2 = (css / nf).max(floor);
        let log_likelihood = -0.5 * nf * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());
        let k = parameter_count as f64;
        let spec = ModelSpec {
            order,
            seasonal_order,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * nf.ln(),
            log_likelihood,
            sigma2,
            parameter_count,
        };
        let coefficients = Coefficients {
            intercept: mu,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ar: sar.to_vec(),
            seasonal_ma: sma.to_vec(),
        };

        Ok(FittedModel::new(
            spec,
            coefficients,
            residuals,
            conditioning,
            values.to_vec(),
            last_period,
        ))
    }
}

/// Yule-Walker start for the non-seasonal AR part, lag-s autocorrelation
/// for the first seasonal AR coefficient, zeros elsewhere
fn initial_guess(centred: &[f64], layout: &Layout, period: usize) -> Vec<f64> {
    let mut start = vec![0.0; layout.dim()];
    let max_lag = layout.p.max(if layout.sp > 0 { period } else { 0 });
    let acov = stats::autocovariance(centred, max_lag);

    if layout.p > 0 {
        let ar = stats::levinson_durbin(&acov, layout.p);
        if stats::max_reflection(&ar) < 0.95 {
            start[..layout.p].copy_from_slice(&ar);
        }
    }
    if layout.sp > 0 && acov[0] > 0.0 {
        let rho = (acov[period] / acov[0]).clamp(-0.5, 0.5);
        start[layout.p + layout.q] = rho;
    }
    start
}
