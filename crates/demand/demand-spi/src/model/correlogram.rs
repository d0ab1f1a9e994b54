//! Autocorrelation diagnostics.

use serde::{Deserialize, Serialize};

/// Sample ACF and PACF of a series, usually the differenced one.
///
/// Both vectors start at lag 1, so `acf[k - 1]` is the lag-`k` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlogram {
    /// Autocorrelations at lags `1..=max_lag`.
    pub acf: Vec<f64>,
    /// Partial autocorrelations at lags `1..=max_lag`.
    pub pacf: Vec<f64>,
    /// Approximate 95% white-noise band, `1.96 / sqrt(n_obs)`.
    pub bound: f64,
    /// Observations the correlations were computed from.
    pub n_obs: usize,
}

impl Correlogram {
    pub fn max_lag(&self) -> usize {
        self.acf.len()
    }

    /// Lags whose autocorrelation lies outside the band.
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        self.outside_band(&self.acf)
    }

    /// Lags whose partial autocorrelation lies outside the band.
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        self.outside_band(&self.pacf)
    }

    /// Length of the leading run of significant partial autocorrelations,
    /// the usual starting guess for the AR order `p`.
    pub fn suggested_ar_order(&self) -> usize {
        self.leading_run(&self.pacf)
    }

    /// Length of the leading run of significant autocorrelations, the usual
    /// starting guess for the MA order `q`.
    pub fn suggested_ma_order(&self) -> usize {
        self.leading_run(&self.acf)
    }

    fn outside_band(&self, values: &[f64]) -> Vec<usize> {
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.abs() > self.bound)
            .map(|(i, _)| i + 1)
            .collect()
    }

    fn leading_run(&self, values: &[f64]) -> usize {
        values.iter().take_while(|v| v.abs() > self.bound).count()
    }
}
