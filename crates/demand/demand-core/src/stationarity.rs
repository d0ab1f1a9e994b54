//! Augmented Dickey-Fuller testing and differencing-order selection
//!
//! The regression is `Δy_t = γ y_{t-1} + α [+ β t] + Σ_{i=1..k} c_i Δy_{t-i}`
//! with `k = floor((n - 1)^(1/3))` unless configured. Critical values and
//! p-values come from Fuller's Dickey-Fuller percentile table, interpolated
//! linearly in `1 / n_obs`.

use std::collections::BTreeMap;

use demand_api::{
    AdfConfig, AdfOutcome, AdfRegression, DemandError, PipelineConfig, Result,
    StationarityReport, StationarityTester,
};
use tracing::{debug, info, warn};

use crate::stats;

/// Cumulative probabilities of the tabulated percentiles
const PROBABILITIES: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];

/// Sample sizes of the table rows; the last row is the asymptotic one
const SAMPLE_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, f64::INFINITY];

const CONSTANT_TABLE: [[f64; 8]; 6] = [
    [-3.75, -3.33, -3.00, -2.63, -0.37, 0.00, 0.34, 0.72],
    [-3.58, -3.22, -2.93, -2.60, -0.40, -0.03, 0.29, 0.66],
    [-3.51, -3.17, -2.89, -2.58, -0.42, -0.05, 0.26, 0.63],
    [-3.46, -3.14, -2.88, -2.57, -0.42, -0.06, 0.24, 0.62],
    [-3.44, -3.13, -2.87, -2.57, -0.43, -0.07, 0.24, 0.61],
    [-3.43, -3.12, -2.86, -2.57, -0.44, -0.07, 0.23, 0.60],
];

const TREND_TABLE: [[f64; 8]; 6] = [
    [-4.38, -3.95, -3.60, -3.24, -1.14, -0.80, -0.50, -0.15],
    [-4.15, -3.80, -3.50, -3.18, -1.19, -0.87, -0.58, -0.24],
    [-4.04, -3.73, -3.45, -3.15, -1.22, -0.90, -0.62, -0.28],
    [-3.99, -3.69, -3.43, -3.13, -1.23, -0.92, -0.64, -0.31],
    [-3.98, -3.68, -3.42, -3.13, -1.24, -0.93, -0.65, -0.32],
    [-3.96, -3.66, -3.41, -3.12, -1.25, -0.94, -0.66, -0.33],
];

/// Shortest series the ADF regression is run on
pub const MIN_ADF_LENGTH: usize = 10;

/// `|γ̂|` at or below this on a residual-free regression is round-off
const GAMMA_ROUNDOFF: f64 = 1e-8;

/// Percentiles of the Dickey-Fuller distribution for `n_obs` observations
fn percentiles(regression: AdfRegression, n_obs: usize) -> [f64; 8] {
    let table = match regression {
        AdfRegression::Constant => &CONSTANT_TABLE,
        AdfRegression::ConstantTrend => &TREND_TABLE,
    };
    let x = 1.0 / n_obs.max(1) as f64;
    let xs: Vec<f64> = SAMPLE_SIZES.iter().map(|s| 1.0 / s).collect();
    if x >= xs[0] {
        return table[0];
    }
    let mut out = table[SAMPLE_SIZES.len() - 1];
    for row in 0..SAMPLE_SIZES.len() - 1 {
        let (hi, lo) = (xs[row], xs[row + 1]);
        if x <= hi && x >= lo {
            let w = (x - lo) / (hi - lo);
            for (j, value) in out.iter_mut().enumerate() {
                *value = table[row + 1][j] + w * (table[row][j] - table[row + 1][j]);
            }
            break;
        }
    }
    out
}

/// Critical values at the 1%, 5% and 10% levels
pub fn critical_values(regression: AdfRegression, n_obs: usize) -> BTreeMap<String, f64> {
    let q = percentiles(regression, n_obs);
    let mut map = BTreeMap::new();
    map.insert("1%".to_string(), q[0]);
    map.insert("5%".to_string(), q[2]);
    map.insert("10%".to_string(), q[3]);
    map
}

/// Left-tail p-value of a Dickey-Fuller statistic, piecewise linear between
/// tabulated percentiles and extrapolated from the outer segments
pub fn p_value(statistic: f64, regression: AdfRegression, n_obs: usize) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }
    let q = percentiles(regression, n_obs);
    let last = q.len() - 1;
    let segment = if statistic <= q[0] {
        0
    } else if statistic >= q[last] {
        last - 1
    } else {
        (0..last).find(|&i| statistic <= q[i + 1]).unwrap_or(last - 1)
    };
    let (q0, q1) = (q[segment], q[segment + 1]);
    let (p0, p1) = (PROBABILITIES[segment], PROBABILITIES[segment + 1]);
    (p0 + (statistic - q0) * (p1 - p0) / (q1 - q0)).clamp(0.0, 1.0)
}

/// ADF statistic, lags and regression size for one series
#[derive(Debug, Clone, PartialEq)]
pub struct AdfStatistic {
    pub statistic: f64,
    pub lags: usize,
    pub n_obs: usize,
}

/// Run the ADF regression, reducing the lag count while the design is singular
pub fn adf_statistic(
    data: &[f64],
    regression: AdfRegression,
    lags: Option<usize>,
) -> Result<AdfStatistic> {
    let n = data.len();
    if n < MIN_ADF_LENGTH {
        return Err(DemandError::InsufficientData {
            required: MIN_ADF_LENGTH,
            actual: n,
        });
    }
    let diffs = stats::difference(data, 1);
    let deterministic = match regression {
        AdfRegression::Constant => 1,
        AdfRegression::ConstantTrend => 2,
    };
    let mut k = lags.unwrap_or_else(|| ((n - 1) as f64).cbrt().floor() as usize);

    loop {
        let columns = 1 + deterministic + k;
        let n_obs = n.saturating_sub(k + 1);
        if n_obs > columns + 1 {
            let mut target = Vec::with_capacity(n_obs);
            let mut design = Vec::with_capacity(n_obs);
            for t in (k + 1)..n {
                target.push(diffs[t - 1]);
                let mut row = Vec::with_capacity(columns);
                row.push(data[t - 1]);
                row.push(1.0);
                if regression == AdfRegression::ConstantTrend {
                    row.push(t as f64);
                }
                for i in 1..=k {
                    row.push(diffs[t - 1 - i]);
                }
                design.push(row);
            }
            if let Some(fit) = stats::ols(&target, &design) {
                // An exact fit leaves only the round-off floor as variance, so
                // a vanishing γ̂ would get an arbitrary sign and size.
                let statistic = if fit.exact && fit.beta[0].abs() <= GAMMA_ROUNDOFF {
                    debug!(gamma = fit.beta[0], "Exact ADF fit without level reversion");
                    0.0
                } else {
                    fit.t_statistic(0)
                };
                return Ok(AdfStatistic {
                    statistic,
                    lags: k,
                    n_obs,
                });
            }
        }
        if k == 0 {
            return Err(DemandError::NumericalError(
                "ADF regression is singular at every lag order".to_string(),
            ));
        }
        debug!(lags = k, "ADF design singular, reducing lags");
        k -= 1;
    }
}

/// Seasonal differencing order from a seasonal unit-root regression.
///
/// Regresses `z_t - z_{t-s}` on `z_{t-s}` and a constant; `D = 1` when the
/// t-statistic fails to reject at `significance` and at least three full
/// cycles are available.
pub fn seasonal_differencing_order(data: &[f64], period: usize, significance: f64) -> usize {
    let n = data.len();
    if period < 2 || n < 3 * period {
        return 0;
    }
    let target: Vec<f64> = (period..n).map(|t| data[t] - data[t - period]).collect();
    let design: Vec<Vec<f64>> = (period..n).map(|t| vec![data[t - period], 1.0]).collect();
    let Some(fit) = stats::ols(&target, &design) else {
        debug!("Seasonal root regression singular, no seasonal differencing");
        return 0;
    };
    let statistic = fit.t_statistic(0);
    let p = p_value(statistic, AdfRegression::Constant, target.len());
    let order = usize::from(p > significance);
    debug!(statistic, p_value = p, seasonal_d = order, "Seasonal unit-root check");
    order
}

/// Iterated ADF tester
#[derive(Debug, Clone)]
pub struct AdfStationarityTester {
    max_differencing: usize,
    significance: f64,
    adf: AdfConfig,
}

impl AdfStationarityTester {
    pub fn new(max_differencing: usize, significance: f64, adf: AdfConfig) -> Self {
        Self {
            max_differencing,
            significance,
            adf,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_differencing, config.significance_threshold, config.adf)
    }

    /// Single ADF test at a known differencing order
    pub fn test_once(&self, data: &[f64], differencing_order: usize) -> Result<AdfOutcome> {
        let adf = adf_statistic(data, self.adf.regression, self.adf.lags)?;
        let p = p_value(adf.statistic, self.adf.regression, adf.n_obs);
        Ok(AdfOutcome {
            differencing_order,
            statistic: adf.statistic,
            p_value: p,
            lags: adf.lags,
            n_obs: adf.n_obs,
            critical_values: critical_values(self.adf.regression, adf.n_obs),
            is_stationary: p <= self.significance,
        })
    }

    fn run(&self, data: &[f64], start_order: usize) -> Result<StationarityReport> {
        let mut series = data.to_vec();
        let mut attempts: Vec<AdfOutcome> = Vec::new();
        let mut order = start_order;
        loop {
            let outcome = self.test_once(&series, order)?;
            info!(
                d = order,
                statistic = outcome.statistic,
                p_value = outcome.p_value,
                stationary = outcome.is_stationary,
                "ADF test"
            );
            let stationary = outcome.is_stationary;
            attempts.push(outcome);

            if stationary {
                let last = &attempts[attempts.len() - 1];
                return Ok(StationarityReport {
                    statistic: last.statistic,
                    p_value: last.p_value,
                    critical_values: last.critical_values.clone(),
                    differencing_order: order,
                    is_stationary: true,
                    significance_threshold: self.significance,
                    lags: last.lags,
                    regression: self.adf.regression,
                    differenced: series,
                    attempts,
                });
            }
            if order >= self.max_differencing {
                let last = &attempts[attempts.len() - 1];
                warn!(
                    max_differencing = self.max_differencing,
                    "Series still non-stationary at the differencing bound"
                );
                return Err(DemandError::NonStationaryAfterMaxDifferencing {
                    max_differencing: self.max_differencing,
                    statistic: last.statistic,
                    p_value: last.p_value,
                });
            }
            series = stats::difference(&series, 1);
            order += 1;
        }
    }
}

impl Default for AdfStationarityTester {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl StationarityTester for AdfStationarityTester {
    fn test(&self, values: &[f64]) -> Result<StationarityReport> {
        self.run(values, 0)
    }

    fn retest(&self, prior: &StationarityReport) -> Result<StationarityReport> {
        self.run(&prior.differenced, prior.differencing_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn random_walk(n: usize, seed: u64) -> Vec<f64> {
        white_noise(n, seed)
            .iter()
            .scan(0.0, |acc, e| {
                *acc += e;
                Some(*acc)
            })
            .collect()
    }

    /// Random walk with drift: the level test has no trend term to absorb it
    fn drifting_walk(n: usize, seed: u64) -> Vec<f64> {
        random_walk(n, seed)
            .iter()
            .enumerate()
            .map(|(t, v)| v + 2.0 * t as f64)
            .collect()
    }

    fn trend_seasonal(n: usize, seed: u64) -> Vec<f64> {
        let shocks = random_walk(n, seed);
        (0..n)
            .map(|t| {
                let tf = t as f64;
                1000.0
                    + 50.0 * tf
                    + 200.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
                    + 30.0 * shocks[t]
            })
            .collect()
    }

    #[test]
    fn test_critical_values_interpolate() {
        let cv = critical_values(AdfRegression::Constant, 75);
        let five = cv["5%"];
        assert!(five < -2.89 && five > -2.93);
        assert_eq!(critical_values(AdfRegression::Constant, 10)["1%"], -3.75);
        let asymptotic = critical_values(AdfRegression::ConstantTrend, 1_000_000);
        assert!((asymptotic["5%"] + 3.41).abs() < 0.01);
    }

    #[test]
    fn test_p_value_agrees_with_critical_value() {
        for n_obs in [30, 60, 120, 400] {
            for regression in [AdfRegression::Constant, AdfRegression::ConstantTrend] {
                let cv5 = critical_values(regression, n_obs)["5%"];
                assert!((p_value(cv5, regression, n_obs) - 0.05).abs() < 1e-12);
                assert!(p_value(cv5 - 0.01, regression, n_obs) < 0.05);
                assert!(p_value(cv5 + 0.01, regression, n_obs) > 0.05);
            }
        }
    }

    #[test]
    fn test_p_value_is_monotone_and_clamped() {
        let mut previous = 0.0;
        for i in 0..100 {
            let stat = -8.0 + i as f64 * 0.1;
            let p = p_value(stat, AdfRegression::Constant, 100);
            assert!(p >= previous);
            assert!((0.0..=1.0).contains(&p));
            previous = p;
        }
        assert_eq!(p_value(-20.0, AdfRegression::Constant, 100), 0.0);
        assert_eq!(p_value(20.0, AdfRegression::Constant, 100), 1.0);
    }

    #[test]
    fn test_white_noise_is_stationary() {
        let report = AdfStationarityTester::default()
            .test(&white_noise(120, 7))
            .unwrap();
        assert_eq!(report.differencing_order, 0);
        assert!(report.is_stationary);
        assert!(report.p_value <= report.significance_threshold);
        assert_eq!(report.lags, 4);
    }

    #[test]
    fn test_drifting_walk_needs_one_difference() {
        let report = AdfStationarityTester::default()
            .test(&drifting_walk(200, 11))
            .unwrap();
        assert_eq!(report.differencing_order, 1);
        assert_eq!(report.attempts.len(), 2);
        assert!(!report.attempts[0].is_stationary);
        assert_eq!(report.differenced.len(), 199);
    }

    #[test]
    fn test_trending_seasonal_series_needs_one_difference() {
        let report = AdfStationarityTester::default()
            .test(&trend_seasonal(72, 2014))
            .unwrap();
        assert!(!report.attempts[0].is_stationary);
        assert_eq!(report.attempts[0].differencing_order, 0);
        assert_eq!(report.differencing_order, 1);
        assert!(report.is_stationary);
    }

    #[test]
    fn test_exact_fit_without_reversion_is_not_rejected() {
        let values: Vec<f64> = (0..72)
            .map(|t| {
                let tf = t as f64;
                1000.0 + 50.0 * tf + 200.0 * (2.0 * std::f64::consts::PI * tf / 12.0).sin()
            })
            .collect();
        let level = adf_statistic(&values, AdfRegression::Constant, None).unwrap();
        assert_eq!(level.statistic, 0.0);

        let report = AdfStationarityTester::default().test(&values).unwrap();
        assert!(!report.attempts[0].is_stationary);
        assert!(report.attempts[0].p_value > 0.9);
        assert_eq!(report.differencing_order, 1);
        assert!(report.statistic < 0.0);
    }

    #[test]
    fn test_retest_is_idempotent() {
        let tester = AdfStationarityTester::default();
        let first = tester.test(&drifting_walk(150, 3)).unwrap();
        let second = tester.retest(&first).unwrap();
        assert_eq!(second.differencing_order, first.differencing_order);
        assert!(second.is_stationary);
        assert_eq!(second.differenced, first.differenced);
    }

    #[test]
    fn test_non_stationary_after_max_differencing() {
        let tester = AdfStationarityTester::new(0, 0.05, AdfConfig::default());
        let err = tester.test(&drifting_walk(100, 5)).unwrap_err();
        match err {
            DemandError::NonStationaryAfterMaxDifferencing {
                max_differencing,
                p_value,
                ..
            } => {
                assert_eq!(max_differencing, 0);
                assert!(p_value > 0.05);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_short_series() {
        let err = AdfStationarityTester::default().test(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, DemandError::InsufficientData { .. }));
    }

    #[test]
    fn test_seasonal_differencing_detects_fixed_pattern() {
        let seasonal: Vec<f64> = (0..48)
            .map(|t| 100.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin())
            .collect();
        assert_eq!(seasonal_differencing_order(&seasonal, 12, 0.05), 1);
        assert_eq!(seasonal_differencing_order(&white_noise(120, 9), 12, 0.05), 0);
        assert_eq!(seasonal_differencing_order(&seasonal[..30], 12, 0.05), 0);
    }
}
