//! Trait for trend linearity analysis

use crate::error::Result;
use crate::model::LinearityReport;

/// Measures how well a straight line in time explains a series.
pub trait LinearityAnalyzer: Send + Sync {
    /// Correlate `values` with the index `0..n-1`.
    fn analyze(&self, values: &[f64]) -> Result<LinearityReport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemandError;

    /// Mock implementation: reports perfect linearity for monotone input
    struct MonotoneAnalyzer;

    impl LinearityAnalyzer for MonotoneAnalyzer {
        fn analyze(&self, values: &[f64]) -> Result<LinearityReport> {
            if values.len() < 3 {
                return Err(DemandError::InsufficientData {
                    required: 3,
                    actual: values.len(),
                });
            }
            let increasing = values.windows(2).all(|w| w[1] > w[0]);
            Ok(LinearityReport {
                correlation: if increasing { 1.0 } else { 0.0 },
                p_value: if increasing { 0.0 } else { 1.0 },
                is_linear: increasing,
                slope: 0.0,
                intercept: 0.0,
                t_statistic: 0.0,
                n: values.len(),
            })
        }
    }

    #[test]
    fn test_mock_analyzer() {
        let a = MonotoneAnalyzer;
        assert!(a.analyze(&[1.0, 2.0, 3.0]).unwrap().is_linear);
        assert!(!a.analyze(&[1.0, 3.0, 2.0]).unwrap().is_linear);
        assert!(matches!(
            a.analyze(&[1.0]),
            Err(DemandError::InsufficientData { required: 3, actual: 1 })
        ));
    }
}
