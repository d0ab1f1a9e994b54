//! Trend linearity report.

use serde::{Deserialize, Serialize};

/// Correlation of a series against its time index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearityReport {
    /// Pearson correlation in [-1, 1].
    pub correlation: f64,
    /// Two-tailed p-value for zero correlation, in [0, 1].
    pub p_value: f64,
    /// Whether the series is classified as linear.
    pub is_linear: bool,
    /// Least-squares slope per period.
    pub slope: f64,
    /// Least-squares intercept at index 0.
    pub intercept: f64,
    /// t-statistic of the correlation with `n - 2` degrees of freedom.
    pub t_statistic: f64,
    /// Number of observations.
    pub n: usize,
}

impl LinearityReport {
    /// Fitted trend value at time index `t`.
    pub fn trend_at(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_at() {
        let report = LinearityReport {
            correlation: 0.99,
            p_value: 0.0,
            is_linear: true,
            slope: 2.0,
            intercept: 10.0,
            t_statistic: 50.0,
            n: 30,
        };
        assert!((report.trend_at(5.0) - 20.0).abs() < 1e-12);
    }
}
