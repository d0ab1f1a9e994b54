//! Unit-root test results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Deterministic terms included in the Dickey-Fuller regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdfRegression {
    /// Constant only.
    #[default]
    Constant,
    /// Constant and linear time trend.
    ConstantTrend,
}

impl fmt::Display for AdfRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdfRegression::Constant => write!(f, "c"),
            AdfRegression::ConstantTrend => write!(f, "ct"),
        }
    }
}

/// One ADF test at a given differencing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfOutcome {
    /// Differences applied before this test.
    pub differencing_order: usize,
    /// t-statistic on the lagged level.
    pub statistic: f64,
    /// Interpolated p-value.
    pub p_value: f64,
    /// Lagged differences in the regression.
    pub lags: usize,
    /// Observations used in the regression.
    pub n_obs: usize,
    /// Critical values keyed by level label ("1%", "5%", "10%").
    pub critical_values: BTreeMap<String, f64>,
    /// `p_value <= significance`.
    pub is_stationary: bool,
}

/// Outcome of the iterated stationarity test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    /// ADF statistic of the final test.
    pub statistic: f64,
    /// p-value of the final test.
    pub p_value: f64,
    /// Critical values of the final test.
    pub critical_values: BTreeMap<String, f64>,
    /// Differences needed to reach stationarity.
    pub differencing_order: usize,
    /// Always `p_value <= significance_threshold`.
    pub is_stationary: bool,
    /// Threshold the decision was made against.
    pub significance_threshold: f64,
    /// Lagged differences used in the final test.
    pub lags: usize,
    /// Deterministic terms used.
    pub regression: AdfRegression,
    /// The series after `differencing_order` differences.
    pub differenced: Vec<f64>,
    /// Every test run, in order of increasing differencing.
    pub attempts: Vec<AdfOutcome>,
}

impl StationarityReport {
    /// Critical value at a level label such as "5%".
    pub fn critical_value(&self, level: &str) -> Option<f64> {
        self.critical_values.get(level).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_value_lookup() {
        let mut critical_values = BTreeMap::new();
        critical_values.insert("5%".to_string(), -2.9);
        let report = StationarityReport {
            statistic: -3.5,
            p_value: 0.01,
            critical_values,
            differencing_order: 1,
            is_stationary: true,
            significance_threshold: 0.05,
            lags: 3,
            regression: AdfRegression::Constant,
            differenced: vec![],
            attempts: vec![],
        };
        assert_eq!(report.critical_value("5%"), Some(-2.9));
        assert_eq!(report.critical_value("2%"), None);
    }

    #[test]
    fn test_regression_display() {
        assert_eq!(AdfRegression::Constant.to_string(), "c");
        assert_eq!(AdfRegression::ConstantTrend.to_string(), "ct");
        assert_eq!(AdfRegression::default(), AdfRegression::Constant);
    }
}
