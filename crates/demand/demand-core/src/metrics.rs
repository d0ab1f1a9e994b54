//! Backtest accuracy of a holdout forecast

use demand_api::AccuracyMetrics;

/// Actuals at or below this magnitude are left out of MAPE
pub const MAPE_ZERO_TOLERANCE: f64 = 1e-10;

/// MAE, RMSE and MAPE of `predicted` against the held-out `actual` values.
///
/// MAPE is in percent over the periods with a non-zero actual; the others
/// are counted in `mape_excluded`, and MAPE is `NaN` when every actual is
/// zero. Empty or mismatched inputs give [`AccuracyMetrics::unavailable`].
pub fn accuracy(actual: &[f64], predicted: &[f64]) -> AccuracyMetrics {
    if actual.len() != predicted.len() || actual.is_empty() {
        return AccuracyMetrics::unavailable();
    }

    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;
    let mut pct_count = 0usize;
    for (a, p) in actual.iter().zip(predicted) {
        let error = a - p;
        abs_sum += error.abs();
        sq_sum += error * error;
        if a.abs() > MAPE_ZERO_TOLERANCE {
            pct_sum += (error / a).abs();
            pct_count += 1;
        }
    }

    let n = actual.len() as f64;
    let mape = if pct_count == 0 {
        f64::NAN
    } else {
        pct_sum / pct_count as f64 * 100.0
    };
    AccuracyMetrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        mape,
        holdout: actual.len(),
        mape_excluded: actual.len() - pct_count,
    }
}
