//! Forecast output types.

use serde::{Deserialize, Serialize};

use super::{ModelSpec, YearMonth};

/// One future period with its prediction interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: YearMonth,
    pub point_forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Forecast standard error at this horizon step.
    pub std_error: f64,
}

impl ForecastPoint {
    pub fn interval_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Holdout accuracy of a refitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error, in percent, over non-zero actuals.
    pub mape: f64,
    /// Held-out periods; zero when the backtest could not run.
    pub holdout: usize,
    /// Held-out periods left out of MAPE because the actual was zero.
    pub mape_excluded: usize,
}

impl AccuracyMetrics {
    /// Metrics for a backtest that could not be run.
    pub fn unavailable() -> Self {
        Self {
            mae: f64::NAN,
            rmse: f64::NAN,
            mape: f64::NAN,
            holdout: 0,
            mape_excluded: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.holdout > 0
    }
}

/// Forecast totals for one calendar year of the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub year: i32,
    /// Forecast months falling in this year.
    pub months: usize,
    pub total: f64,
    /// Average monthly forecast.
    pub average: f64,
    /// Percent change of the monthly average against the previous year,
    /// `None` for the first year.
    pub growth_rate: Option<f64>,
}

/// Point forecasts, intervals and backtest accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Model that produced the forecast.
    pub spec: ModelSpec,
    pub horizon_points: Vec<ForecastPoint>,
    pub metrics: AccuracyMetrics,
    pub confidence_level: f64,
}

impl ForecastResult {
    pub fn horizon(&self) -> usize {
        self.horizon_points.len()
    }

    pub fn point_forecasts(&self) -> Vec<f64> {
        self.horizon_points.iter().map(|p| p.point_forecast).collect()
    }

    /// Horizon point with the largest point forecast.
    pub fn peak(&self) -> Option<&ForecastPoint> {
        self.horizon_points
            .iter()
            .max_by(|a, b| a.point_forecast.total_cmp(&b.point_forecast))
    }

    /// Per-year totals over the horizon, in calendar order.
    pub fn annual_summaries(&self) -> Vec<AnnualSummary> {
        let mut summaries: Vec<AnnualSummary> = Vec::new();
        for point in &self.horizon_points {
            match summaries.last_mut() {
                Some(last) if last.year == point.period.year => {
                    last.months += 1;
                    last.total += point.point_forecast;
                }
                _ => summaries.push(AnnualSummary {
                    year: point.period.year,
                    months: 1,
                    total: point.point_forecast,
                    average: 0.0,
                    growth_rate: None,
                }),
            }
        }

        let mut previous_average: Option<f64> = None;
        for summary in summaries.iter_mut() {
            summary.average = summary.total / summary.months as f64;
            summary.growth_rate = previous_average
                .filter(|prev| prev.abs() > f64::EPSILON)
                .map(|prev| (summary.average - prev) / prev.abs() * 100.0);
            previous_average = Some(summary.average);
        }
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Order, SeasonalOrder};

    fn result(values: &[f64], start: YearMonth) -> ForecastResult {
        let horizon_points = values
            .iter()
            .enumerate()
            .map(|(i, &v)| ForecastPoint {
                period: start.offset(i as i64),
                point_forecast: v,
                lower_bound: v - 1.0,
                upper_bound: v + 1.0,
                std_error: 0.5,
            })
            .collect();
        ForecastResult {
            spec: ModelSpec::unscored(Order::new(0, 1, 0), SeasonalOrder::none(12)),
            horizon_points,
            metrics: AccuracyMetrics::unavailable(),
            confidence_level: 0.95,
        }
    }

    #[test]
    fn test_annual_summaries_split_by_year() {
        let start = YearMonth::new(2020, 11).unwrap();
        let mut values = vec![10.0, 10.0];
        values.extend(std::iter::repeat(11.0).take(12));
        let r = result(&values, start);

        let summaries = r.annual_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, 2020);
        assert_eq!(summaries[0].months, 2);
        assert!((summaries[0].total - 20.0).abs() < 1e-12);
        assert_eq!(summaries[0].growth_rate, None);
        assert_eq!(summaries[1].months, 12);
        assert!((summaries[1].average - 11.0).abs() < 1e-12);
        assert!((summaries[1].growth_rate.unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_peak() {
        let r = result(&[3.0, 9.0, 4.0], YearMonth::new(2021, 1).unwrap());
        let peak = r.peak().unwrap();
        assert_eq!(peak.period, YearMonth::new(2021, 2).unwrap());
        assert_eq!(peak.point_forecast, 9.0);
    }

    #[test]
    fn test_unavailable_metrics() {
        let m = AccuracyMetrics::unavailable();
        assert!(!m.is_available());
        assert!(m.mae.is_nan());
    }

    #[test]
    fn test_empty_horizon() {
        let r = result(&[], YearMonth::new(2021, 1).unwrap());
        assert!(r.peak().is_none());
        assert!(r.annual_summaries().is_empty());
        assert_eq!(r.horizon(), 0);
    }
}
