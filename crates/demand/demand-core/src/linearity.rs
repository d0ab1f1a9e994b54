//! Trend linearity analysis
//!
//! Pearson correlation of the series against its time index with a
//! Student-t significance test on `n - 2` degrees of freedom.

use demand_api::{
    DemandError, LinearityAnalyzer, LinearityConfig, LinearityReport, PipelineConfig, Result,
};
use tracing::debug;

use crate::stats;

/// Correlation-based linearity analyzer
#[derive(Debug, Clone, Default)]
pub struct PearsonLinearityAnalyzer {
    config: LinearityConfig,
}

impl PearsonLinearityAnalyzer {
    pub fn new(config: LinearityConfig) -> Self {
        Self { config }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.linearity)
    }
}

impl LinearityAnalyzer for PearsonLinearityAnalyzer {
    fn analyze(&self, values: &[f64]) -> Result<LinearityReport> {
        let n = values.len();
        if n < 3 {
            return Err(DemandError::InsufficientData {
                required: 3,
                actual: n,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(DemandError::NumericalError(
                "series contains non-finite values".to_string(),
            ));
        }

        let t_mean = (n - 1) as f64 / 2.0;
        let y_mean = stats::mean(values);
        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (t, &y) in values.iter().enumerate() {
            let dt = t as f64 - t_mean;
            let dy = y - y_mean;
            sxx += dt * dt;
            sxy += dt * dy;
            syy += dy * dy;
        }

        let constant = values.iter().all(|&v| v == values[0]);
        if constant || syy <= 0.0 {
            return Err(DemandError::DegenerateSeries {
                len: n,
                value: values[0],
            });
        }

        let correlation = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
        let df = (n - 2) as f64;
        let unexplained = 1.0 - correlation * correlation;
        let t_statistic = if unexplained <= 1e-12 {
            f64::INFINITY.copysign(correlation)
        } else {
            correlation * (df / unexplained).sqrt()
        };
        let p_value = stats::students_t_two_tailed(t_statistic, df).ok_or_else(|| {
            DemandError::NumericalError("invalid t distribution".to_string())
        })?;

        let slope = sxy / sxx;
        let intercept = y_mean - slope * t_mean;
        let is_linear =
            correlation.abs() >= self.config.min_abs_correlation && p_value < self.config.significance;

        debug!(correlation, p_value, is_linear, "Linearity analysed");
        Ok(LinearityReport {
            correlation,
            p_value,
            is_linear,
            slope,
            intercept,
            t_statistic,
            n,
        })
    }
}
