//! Classical additive decomposition: Y = T + S + R
//!
//! The trend is a centered moving average (a 2 x s average for even
//! periods), so the first and last `s / 2` months have no trend value.

use demand_api::{Decomposer, Decomposition, DemandError, Result};
use tracing::debug;

use crate::stats;

/// Additive decomposer using a centered moving average trend
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditiveDecomposer;

impl AdditiveDecomposer {
    pub fn new() -> Self {
        Self
    }
}

impl Decomposer for AdditiveDecomposer {
    fn decompose(&self, values: &[f64], period: usize) -> Result<Decomposition> {
        decompose_additive(values, period)
    }
}

/// Centered moving average of window `period`, `None` where the window
/// does not fit inside the series
pub fn centered_moving_average(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let half = period / 2;
    let mut trend = vec![None; n];
    if period == 0 || n < 2 * half + 1 {
        return trend;
    }
    for i in half..(n - half) {
        let sum = if period % 2 == 1 {
            data[i - half..=i + half].iter().sum::<f64>()
        } else {
            0.5 * data[i - half]
                + data[i - half + 1..i + half].iter().sum::<f64>()
                + 0.5 * data[i + half]
        };
        trend[i] = Some(sum / period as f64);
    }
    trend
}

/// Perform additive decomposition
pub fn decompose_additive(data: &[f64], period: usize) -> Result<Decomposition> {
    let n = data.len();
    if period < 2 {
        return Err(DemandError::invalid_parameter(
            "period",
            "seasonal period must be at least 2",
        ));
    }
    if n < period * 2 {
        return Err(DemandError::InsufficientData {
            required: period * 2,
            actual: n,
        });
    }

    let trend = centered_moving_average(data, period);

    // Seasonal indices: mean detrended value per cycle position, centred on zero
    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for (i, t) in trend.iter().enumerate() {
        if let Some(t) = t {
            sums[i % period] += data[i] - t;
            counts[i % period] += 1;
        }
    }
    let position_means: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let grand_mean = stats::mean(&position_means);
    let seasonal_indices: Vec<f64> = position_means.iter().map(|m| m - grand_mean).collect();

    let seasonal: Vec<f64> = (0..n).map(|i| seasonal_indices[i % period]).collect();

    let residual: Vec<Option<f64>> = trend
        .iter()
        .enumerate()
        .map(|(i, t)| t.map(|t| data[i] - t - seasonal[i]))
        .collect();

    let seasonal_strength = seasonal_strength(&seasonal, &residual);
    debug!(period, seasonal_strength, "Series decomposed");

    Ok(Decomposition {
        period,
        trend,
        seasonal,
        residual,
        seasonal_indices,
        seasonal_strength,
    })
}

/// `1 - Var(R) / Var(S + R)` over positions with a defined residual, in [0, 1]
fn seasonal_strength(seasonal: &[f64], residual: &[Option<f64>]) -> f64 {
    let (remainder, detrended): (Vec<f64>, Vec<f64>) = residual
        .iter()
        .zip(seasonal)
        .filter_map(|(r, s)| r.map(|r| (r, s + r)))
        .unzip();
    let var_detrended = stats::variance(&detrended);
    if var_detrended.is_nan() || var_detrended <= f64::EPSILON {
        return 0.0;
    }
    (1.0 - stats::variance(&remainder) / var_detrended).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_trend(n: usize, period: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                100.0 + 2.0 * t + 10.0 * (2.0 * std::f64::consts::PI * t / period as f64).sin()
                    + if i % 5 == 0 { 1.5 } else { -0.4 }
            })
            .collect()
    }

    #[test]
    fn test_additive_identity() {
        let data = seasonal_trend(60, 12);
        let result = decompose_additive(&data, 12).unwrap();
        assert_eq!(result.trend.len(), data.len());
        assert_eq!(result.seasonal.len(), data.len());
        assert_eq!(result.residual.len(), data.len());
        for (i, &v) in data.iter().enumerate() {
            if let Some(rebuilt) = result.reconstruct(i) {
                assert!((rebuilt - v).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_boundary_is_sparse() {
        let data = seasonal_trend(48, 12);
        let result = decompose_additive(&data, 12).unwrap();
        assert!(result.trend[..6].iter().all(Option::is_none));
        assert!(result.trend[42..].iter().all(Option::is_none));
        assert!(result.trend[6..42].iter().all(Option::is_some));
        assert_eq!(result.defined_len(), 36);
    }

    #[test]
    fn test_odd_period_window() {
        let data = seasonal_trend(21, 7);
        let result = decompose_additive(&data, 7).unwrap();
        assert!(result.trend[..3].iter().all(Option::is_none));
        assert!(result.trend[3].is_some());
        assert!(result.trend[18..].iter().all(Option::is_none));
    }

    #[test]
    fn test_seasonal_indices_sum_to_zero() {
        let data = seasonal_trend(72, 12);
        let result = decompose_additive(&data, 12).unwrap();
        assert_eq!(result.seasonal_indices.len(), 12);
        assert!(result.seasonal_indices.iter().sum::<f64>().abs() < 1e-9);
        let cycle: f64 = result.seasonal[..12].iter().sum();
        assert!(cycle.abs() < 1e-9);
    }

    #[test]
    fn test_linear_trend_recovered_exactly() {
        let data: Vec<f64> = (0..36).map(|i| 5.0 + 3.0 * i as f64).collect();
        let trend = centered_moving_average(&data, 12);
        for (i, t) in trend.iter().enumerate() {
            if let Some(t) = t {
                assert!((t - data[i]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_seasonal_strength_bounds() {
        let strong = decompose_additive(&seasonal_trend(72, 12), 12).unwrap();
        assert!(strong.seasonal_strength > 0.8);
        assert!(strong.seasonal_strength <= 1.0);

        let line: Vec<f64> = (0..36).map(|i| i as f64).collect();
        let none = decompose_additive(&line, 12).unwrap();
        assert_eq!(none.seasonal_strength, 0.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            decompose_additive(&[1.0; 10], 1),
            Err(DemandError::InvalidParameter { .. })
        ));
        assert!(matches!(
            decompose_additive(&[1.0; 23], 12),
            Err(DemandError::InsufficientData { required: 24, actual: 23 })
        ));
    }
}
