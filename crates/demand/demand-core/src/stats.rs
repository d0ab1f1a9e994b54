//! Numerical kernel shared by the pipeline stages
//!
//! Descriptive statistics, differencing, least squares, the Levinson-Durbin
//! recursion and the distribution lookups used by the hypothesis tests.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

/// Arithmetic mean, `NaN` for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance, `NaN` for an empty slice
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Median, `NaN` for an empty slice
pub fn median(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median absolute deviation around `center`
pub fn mad(data: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = data.iter().map(|x| (x - center).abs()).collect();
    median(&deviations)
}

/// Lag-`lag` differences `x[t] - x[t - lag]`
pub fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 || data.len() <= lag {
        return Vec::new();
    }
    (lag..data.len()).map(|t| data[t] - data[t - lag]).collect()
}

/// Apply `d` first differences and `seasonal_d` lag-`period` differences
pub fn apply_differencing(data: &[f64], d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut out = data.to_vec();
    for _ in 0..d {
        out = difference(&out, 1);
    }
    for _ in 0..seasonal_d {
        out = difference(&out, period);
    }
    out
}

/// Product of two polynomials in the backshift operator, lowest power first
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Coefficients `δ_i` with `(1-B)^d (1-B^s)^D = 1 - Σ δ_i B^i`, index 0 unused
///
/// The returned vector has `δ[0] = 0` so that `δ[i]` lines up with lag `i`.
pub fn integration_weights(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal_d {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        poly = poly_mul(&poly, &seasonal);
    }
    let mut weights: Vec<f64> = poly.iter().map(|c| -c).collect();
    weights[0] = 0.0;
    weights
}

/// Sample autocovariances up to `max_lag`, divided by `n`
pub fn autocovariance(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return vec![0.0; max_lag + 1];
    }
    let m = mean(data);
    (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            (k..n).map(|i| (data[i] - m) * (data[i - k] - m)).sum::<f64>() / n as f64
        })
        .collect()
}

/// Sample autocorrelations at lags `1..=max_lag`
///
/// Zero at every lag when the series has no variance.
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let acov = autocovariance(data, max_lag);
    if acov[0].abs() < 1e-12 {
        return vec![0.0; max_lag];
    }
    acov[1..].iter().map(|c| c / acov[0]).collect()
}

/// Sample partial autocorrelations at lags `1..=max_lag`.
///
/// The lag-k value is the last coefficient of the order-k Yule-Walker fit.
pub fn pacf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let acov = autocovariance(data, max_lag);
    (1..=max_lag)
        .map(|k| levinson_durbin(&acov, k).last().copied().unwrap_or(0.0))
        .collect()
}

/// Solve the Yule-Walker equations by the Levinson-Durbin recursion.
///
/// Returns AR coefficients with sign convention `x_t = Σ φ_i x_{t-i} + e_t`,
/// or zeros when the autocovariance at lag 0 vanishes.
pub fn levinson_durbin(acov: &[f64], order: usize) -> Vec<f64> {
    let mut coeffs = vec![0.0; order];
    if order == 0 || acov.len() <= order || acov[0].abs() < 1e-10 {
        return coeffs;
    }

    let mut error = acov[0];
    for k in 0..order {
        let mut acc = acov[k + 1];
        for j in 0..k {
            acc -= coeffs[j] * acov[k - j];
        }
        if error.abs() < 1e-10 {
            break;
        }
        let reflection = acc / error;
        let previous = coeffs.clone();
        coeffs[k] = reflection;
        for j in 0..k {
            coeffs[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
    }
    coeffs
}

/// Largest reflection-coefficient magnitude of `1 - Σ a_i B^i`.
///
/// The polynomial has all roots outside the unit circle exactly when the
/// result is below one. Returns infinity when the step-down breaks down.
pub fn max_reflection(coeffs: &[f64]) -> f64 {
    let mut a = coeffs.to_vec();
    while a.last().map_or(false, |c| *c == 0.0) {
        a.pop();
    }
    let mut largest: f64 = 0.0;
    while let Some(&k) = a.last() {
        if !k.is_finite() || k.abs() >= 1.0 {
            return f64::INFINITY;
        }
        largest = largest.max(k.abs());
        let m = a.len();
        let denom = 1.0 - k * k;
        let next: Vec<f64> = (0..m - 1)
            .map(|j| (a[j] + k * a[m - 2 - j]) / denom)
            .collect();
        a = next;
    }
    largest
}

/// Theil-Sen line through `(xs, ys)` as `(intercept, slope)`.
///
/// The slope is the median of the pairwise slopes and the intercept the
/// median of `y - slope * x`. `None` with fewer than two distinct `x`.
pub fn theil_sen(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() {
        return None;
    }
    let mut slopes = Vec::with_capacity(xs.len() * xs.len().saturating_sub(1) / 2);
    for i in 0..xs.len() {
        for j in (i + 1)..xs.len() {
            let dx = xs[j] - xs[i];
            if dx != 0.0 {
                slopes.push((ys[j] - ys[i]) / dx);
            }
        }
    }
    if slopes.is_empty() {
        return None;
    }
    let slope = median(&slopes);
    let offsets: Vec<f64> = xs.iter().zip(ys).map(|(x, y)| y - slope * x).collect();
    Some((median(&offsets), slope))
}

/// Ordinary least squares fit
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub sigma2: f64,
    pub residuals: Vec<f64>,
    /// The residual variance vanished and `sigma2` is the round-off floor
    pub exact: bool,
}

impl OlsFit {
    /// t-statistic of coefficient `index`
    pub fn t_statistic(&self, index: usize) -> f64 {
        self.beta[index] / self.std_errors[index]
    }
}

/// Least squares of `y` on the columns of `design` (each row one observation).
///
/// Returns `None` when the normal equations are numerically singular or
/// there are no residual degrees of freedom.
pub fn ols(y: &[f64], design: &[Vec<f64>]) -> Option<OlsFit> {
    let n = y.len();
    let k = design.first().map_or(0, |row| row.len());
    if k == 0 || n != design.len() || n <= k {
        return None;
    }

    let mut xtx = vec![0.0; k * k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i * k + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j * k + i] = xtx[i * k + j];
        }
    }

    let chol = cholesky(&xtx, k)?;
    let beta = cholesky_solve(&chol, k, &xty);

    let residuals: Vec<f64> = design
        .iter()
        .zip(y)
        .map(|(row, &target)| target - row.iter().zip(&beta).map(|(x, b)| x * b).sum::<f64>())
        .collect();
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    let scale = 1.0 + y.iter().map(|v| v * v).sum::<f64>() / n as f64;
    let floor = f64::EPSILON * scale;
    let exact = rss / ((n - k) as f64) < floor;
    let sigma2 = (rss / (n - k) as f64).max(floor);

    let std_errors = (0..k)
        .map(|i| {
            let mut unit = vec![0.0; k];
            unit[i] = 1.0;
            let column = cholesky_solve(&chol, k, &unit);
            (sigma2 * column[i]).sqrt()
        })
        .collect();

    Some(OlsFit {
        beta,
        std_errors,
        sigma2,
        residuals,
        exact,
    })
}

/// Lower Cholesky factor of a row-major `k x k` symmetric matrix
fn cholesky(a: &[f64], k: usize) -> Option<Vec<f64>> {
    let max_diag = (0..k).map(|i| a[i * k + i].abs()).fold(0.0, f64::max);
    let tolerance = 1e-9 * max_diag.max(f64::MIN_POSITIVE);
    let mut l = vec![0.0; k * k];
    for i in 0..k {
        for j in 0..=i {
            let mut sum = a[i * k + j];
            for m in 0..j {
                sum -= l[i * k + m] * l[j * k + m];
            }
            if i == j {
                if sum <= tolerance || !sum.is_finite() {
                    return None;
                }
                l[i * k + i] = sum.sqrt();
            } else {
                l[i * k + j] = sum / l[j * k + j];
            }
        }
    }
    Some(l)
}

fn cholesky_solve(l: &[f64], k: usize, b: &[f64]) -> Vec<f64> {
    let mut z = vec![0.0; k];
    for i in 0..k {
        let mut sum = b[i];
        for m in 0..i {
            sum -= l[i * k + m] * z[m];
        }
        z[i] = sum / l[i * k + i];
    }
    let mut x = vec![0.0; k];
    for i in (0..k).rev() {
        let mut sum = z[i];
        for m in (i + 1)..k {
            sum -= l[m * k + i] * x[m];
        }
        x[i] = sum / l[i * k + i];
    }
    x
}

/// Two-tailed p-value of a t-statistic with `df` degrees of freedom
pub fn students_t_two_tailed(t: f64, df: f64) -> Option<f64> {
    if t.is_infinite() {
        return Some(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Ljung-Box portmanteau statistic and its chi-square p-value
pub fn ljung_box(residuals: &[f64], lags: usize, fitted_params: usize) -> Option<(f64, f64)> {
    let n = residuals.len();
    if lags == 0 || n <= lags {
        return None;
    }
    let acov = autocovariance(residuals, lags);
    if acov[0] <= 0.0 {
        return None;
    }
    let nf = n as f64;
    let q = nf
        * (nf + 2.0)
        * (1..=lags)
            .map(|k| (acov[k] / acov[0]).powi(2) / (nf - k as f64))
            .sum::<f64>();
    let df = lags.saturating_sub(fitted_params).max(1) as f64;
    let dist = ChiSquared::new(df).ok()?;
    Some((q, (1.0 - dist.cdf(q)).clamp(0.0, 1.0)))
}

/// Two-sided standard normal critical value for `confidence_level`
pub fn z_score(confidence_level: f64) -> Option<f64> {
    let normal = Normal::new(0.0, 1.0).ok()?;
    Some(normal.inverse_cdf(0.5 + confidence_level / 2.0))
}
