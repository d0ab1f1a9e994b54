//! Trait for forecast generation

use crate::error::Result;
use crate::model::{FittedModel, ForecastResult};

/// Produces horizon forecasts with prediction intervals and backtest metrics.
pub trait Forecaster: Send + Sync {
    /// Forecast `horizon` periods past the end of the training data.
    fn forecast(
        &self,
        model: &FittedModel,
        horizon: usize,
        confidence_level: f64,
    ) -> Result<ForecastResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemandError;
    use crate::model::{
        AccuracyMetrics, Coefficients, ForecastPoint, ModelSpec, Order, SeasonalOrder, YearMonth,
    };

    /// Mock implementation: naive last-value forecast with a fixed band
    struct NaiveForecaster;

    impl Forecaster for NaiveForecaster {
        fn forecast(
            &self,
            model: &FittedModel,
            horizon: usize,
            confidence_level: f64,
        ) -> Result<ForecastResult> {
            let last = *model.training().last().ok_or(DemandError::InsufficientData {
                required: 1,
                actual: 0,
            })?;
            let horizon_points = (1..=horizon)
                .map(|h| ForecastPoint {
                    period: model.last_period().offset(h as i64),
                    point_forecast: last,
                    lower_bound: last - h as f64,
                    upper_bound: last + h as f64,
                    std_error: h as f64 / 2.0,
                })
                .collect();
            Ok(ForecastResult {
                spec: model.spec().clone(),
                horizon_points,
                metrics: AccuracyMetrics::unavailable(),
                confidence_level,
            })
        }
    }

    #[test]
    fn test_mock_forecaster_interval_ordering() {
        let model = FittedModel::new(
            ModelSpec::unscored(Order::new(0, 1, 0), SeasonalOrder::none(12)),
            Coefficients::default(),
            vec![],
            0,
            vec![5.0, 6.0],
            YearMonth::new(2020, 12).unwrap(),
        );
        let result = NaiveForecaster.forecast(&model, 3, 0.95).unwrap();
        assert_eq!(result.horizon(), 3);
        assert_eq!(result.horizon_points[0].period, YearMonth::new(2021, 1).unwrap());
        for p in &result.horizon_points {
            assert!(p.lower_bound <= p.point_forecast && p.point_forecast <= p.upper_bound);
        }
    }
}
