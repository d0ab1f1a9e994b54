//! Correlogram of a series for choosing SARIMA orders by hand

use demand_api::{Correlogram, DemandError, Result};
use tracing::debug;

use crate::stats;

/// Two-sided 95% standard normal quantile
const WHITE_NOISE_Z: f64 = 1.959964;

/// Sample ACF and PACF at lags `1..=max_lag`.
///
/// Needs at least `max_lag + 2` observations.
pub fn correlogram(values: &[f64], max_lag: usize) -> Result<Correlogram> {
    if max_lag == 0 {
        return Err(DemandError::invalid_parameter(
            "max_lag",
            "must be at least one lag",
        ));
    }
    let n = values.len();
    if n < max_lag + 2 {
        return Err(DemandError::InsufficientData {
            required: max_lag + 2,
            actual: n,
        });
    }
    let correlogram = Correlogram {
        acf: stats::acf(values, max_lag),
        pacf: stats::pacf(values, max_lag),
        bound: WHITE_NOISE_Z / (n as f64).sqrt(),
        n_obs: n,
    };
    debug!(
        max_lag,
        significant_acf = ?correlogram.significant_acf_lags(),
        significant_pacf = ?correlogram.significant_pacf_lags(),
        "Correlogram computed"
    );
    Ok(correlogram)
}
