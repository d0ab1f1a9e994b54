//! Model order and specification types.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Non-seasonal ARIMA order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Order {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Order {
    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// Seasonal order `(P, D, Q)` with period `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub const fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    /// A seasonal order with no seasonal terms.
    pub const fn none(period: usize) -> Self {
        Self::new(0, 0, 0, period)
    }

    /// Whether any seasonal AR, MA or differencing term is present.
    pub fn is_seasonal(&self) -> bool {
        self.period >= 2 && (self.p > 0 || self.d > 0 || self.q > 0)
    }
}

impl fmt::Display for SeasonalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})[{}]", self.p, self.d, self.q, self.period)
    }
}

/// A scored candidate model, identified by `(order, seasonal_order)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub order: Order,
    pub seasonal_order: SeasonalOrder,
    /// Akaike information criterion; infinite when the fit failed.
    pub aic: f64,
    /// Bayesian information criterion; infinite when the fit failed.
    pub bic: f64,
    pub log_likelihood: f64,
    /// Innovation variance estimate.
    pub sigma2: f64,
    /// Estimated parameters including the intercept.
    pub parameter_count: usize,
}

impl ModelSpec {
    /// An unscored specification, used for candidates whose fit failed.
    pub fn unscored(order: Order, seasonal_order: SeasonalOrder) -> Self {
        let parameter_count =
            order.p + order.q + seasonal_order.p + seasonal_order.q + 1;
        Self {
            order,
            seasonal_order,
            aic: f64::INFINITY,
            bic: f64::INFINITY,
            log_likelihood: f64::NEG_INFINITY,
            sigma2: f64::NAN,
            parameter_count,
        }
    }

    /// Identity key of the candidate.
    pub fn key(&self) -> (Order, SeasonalOrder) {
        (self.order, self.seasonal_order)
    }

    /// Ranking: AIC, then BIC, then fewer parameters, then order.
    pub fn rank_cmp(&self, other: &ModelSpec) -> Ordering {
        self.aic
            .total_cmp(&other.aic)
            .then_with(|| self.bic.total_cmp(&other.bic))
            .then_with(|| self.parameter_count.cmp(&other.parameter_count))
            .then_with(|| self.key().cmp(&other.key()))
    }

    /// Human-readable label such as `SARIMA(2,1,2)(1,1,1)[12]`.
    pub fn label(&self) -> String {
        if self.seasonal_order.is_seasonal() {
            format!("SARIMA{}{}", self.order, self.seasonal_order)
        } else {
            format!("ARIMA{}", self.order)
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AIC={:.2} BIC={:.2}", self.label(), self.aic, self.bic)
    }
}

/// Why a candidate was excluded from ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Too few observations after differencing for the parameter count.
    InsufficientData { required: usize, actual: usize },
    /// The optimiser hit its evaluation cap.
    DidNotConverge { iterations: usize },
    /// AR polynomial has a root on or inside the unit circle.
    NonStationaryAr,
    /// MA polynomial has a root on or inside the unit circle.
    NonInvertibleMa,
    /// Ljung-Box test rejected white-noise residuals.
    ResidualAutocorrelation {
        q_statistic: f64,
        p_value: f64,
        lags: usize,
    },
    /// Non-finite objective or similar.
    NumericalFailure(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::InsufficientData { required, actual } => {
                write!(f, "insufficient data: need {}, got {}", required, actual)
            }
            RejectionReason::DidNotConverge { iterations } => {
                write!(f, "did not converge after {} iterations", iterations)
            }
            RejectionReason::NonStationaryAr => write!(f, "non-stationary AR roots"),
            RejectionReason::NonInvertibleMa => write!(f, "non-invertible MA roots"),
            RejectionReason::ResidualAutocorrelation {
                q_statistic,
                p_value,
                lags,
            } => write!(
                f,
                "residual autocorrelation: Q({})={:.3}, p={:.4}",
                lags, q_statistic, p_value
            ),
            RejectionReason::NumericalFailure(msg) => write!(f, "numerical failure: {}", msg),
        }
    }
}

/// Whether a searched candidate entered the ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Accepted,
    Rejected(RejectionReason),
}

/// One searched candidate in the shortlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    pub spec: ModelSpec,
    pub status: CandidateStatus,
}

impl ShortlistEntry {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, CandidateStatus::Accepted)
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match &self.status {
            CandidateStatus::Accepted => None,
            CandidateStatus::Rejected(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(p: usize, q: usize, aic: f64, bic: f64) -> ModelSpec {
        ModelSpec {
            order: Order::new(p, 1, q),
            seasonal_order: SeasonalOrder::new(1, 1, 1, 12),
            aic,
            bic,
            log_likelihood: 0.0,
            sigma2: 1.0,
            parameter_count: p + q + 3,
        }
    }

    #[test]
    fn test_label_seasonal_and_plain() {
        let s = spec(2, 2, 1247.83, 1268.91);
        assert_eq!(s.label(), "SARIMA(2,1,2)(1,1,1)[12]");

        let plain = ModelSpec::unscored(Order::new(1, 1, 0), SeasonalOrder::none(12));
        assert_eq!(plain.label(), "ARIMA(1,1,0)");
    }

    #[test]
    fn test_unscored_counts_intercept() {
        let s = ModelSpec::unscored(Order::new(2, 1, 1), SeasonalOrder::new(1, 1, 0, 12));
        assert_eq!(s.parameter_count, 5);
        assert!(s.aic.is_infinite());
    }

    #[test]
    fn test_rank_cmp_aic_primary_bic_tiebreak() {
        let a = spec(1, 0, 100.0, 120.0);
        let b = spec(0, 1, 100.0, 110.0);
        let c = spec(0, 0, 99.0, 200.0);
        assert_eq!(c.rank_cmp(&a), Ordering::Less);
        assert_eq!(b.rank_cmp(&a), Ordering::Less);
    }

    #[test]
    fn test_rank_cmp_breaks_full_ties_by_order() {
        let a = spec(1, 0, 100.0, 110.0);
        let b = spec(0, 1, 100.0, 110.0);
        assert_eq!(b.rank_cmp(&a), Ordering::Less);
    }

    #[test]
    fn test_shortlist_entry_rejection() {
        let entry = ShortlistEntry {
            spec: spec(1, 1, 1.0, 1.0),
            status: CandidateStatus::Rejected(RejectionReason::NonInvertibleMa),
        };
        assert!(!entry.is_accepted());
        assert_eq!(entry.rejection(), Some(&RejectionReason::NonInvertibleMa));
    }

    #[test]
    fn test_rejection_display() {
        let reason = RejectionReason::ResidualAutocorrelation {
            q_statistic: 31.5,
            p_value: 0.002,
            lags: 24,
        };
        assert_eq!(
            reason.to_string(),
            "residual autocorrelation: Q(24)=31.500, p=0.0020"
        );
    }
}
