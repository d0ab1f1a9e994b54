//! Raw series validation
//!
//! Rejects malformed input, fills missing months up to one seasonal cycle
//! and replaces outliers found by a median absolute deviation screen.
//!
//! The screen compares each point with a robust line through its local
//! window and with the same season in the neighbouring cycles. Only points
//! extreme on both counts are replaced, so steady growth and recurring
//! seasonal lows (including zero months) pass through untouched.

use std::ops::Range;

use demand_api::{
    DemandError, Observation, ObservationSeries, OutlierConfig, PipelineConfig, RawObservation,
    Replacement, ReplacementCause, Result, SeriesValidator, ValidationErrorKind,
};
use tracing::{debug, info};

use crate::stats;

/// Scale factor that makes the MAD a consistent estimator of the normal sigma
const MAD_SCALE: f64 = 1.4826;

/// Smallest spread, relative to the median magnitude, the screen divides by
const SPREAD_FLOOR: f64 = 1e-9;

const MIN_HALF_WINDOW: usize = 3;

/// Validator with MAD-based outlier replacement
#[derive(Debug, Clone)]
pub struct MadSeriesValidator {
    config: OutlierConfig,
    min_length: usize,
    period: usize,
}

impl MadSeriesValidator {
    /// `period` is the seasonal cycle length; it sizes the outlier screen
    /// and bounds the longest gap that is interpolated.
    pub fn new(config: OutlierConfig, min_length: usize, period: usize) -> Self {
        Self {
            config,
            min_length,
            period,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.outlier, config.min_series_length(), config.seasonal_period)
    }

    pub fn config(&self) -> &OutlierConfig {
        &self.config
    }

    fn complete_records(raw: &[RawObservation]) -> Result<Vec<Observation>> {
        let missing: Vec<usize> = raw
            .iter()
            .enumerate()
            .filter(|(_, r)| r.period.is_none() || !r.value.map_or(false, f64::is_finite))
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            return Err(DemandError::validation(
                ValidationErrorKind::MissingField,
                missing.clone(),
                format!("{} record(s) lack a period or a finite value", missing.len()),
            ));
        }
        Ok(raw
            .iter()
            .filter_map(|r| match (r.period, r.value) {
                (Some(period), Some(value)) => Some(Observation { period, value }),
                _ => None,
            })
            .collect())
    }

    fn check_order(records: &[Observation]) -> Result<()> {
        let mut first_kind: Option<ValidationErrorKind> = None;
        let mut non_monotonic = Vec::new();
        let mut duplicates = Vec::new();
        for (i, pair) in records.windows(2).enumerate() {
            let kind = match pair[1].period.cmp(&pair[0].period) {
                std::cmp::Ordering::Less => {
                    non_monotonic.push(i + 1);
                    ValidationErrorKind::NonMonotonicPeriod
                }
                std::cmp::Ordering::Equal => {
                    duplicates.push(i + 1);
                    ValidationErrorKind::DuplicatePeriod
                }
                std::cmp::Ordering::Greater => continue,
            };
            first_kind.get_or_insert(kind);
        }
        match first_kind {
            None => Ok(()),
            Some(ValidationErrorKind::DuplicatePeriod) => Err(DemandError::validation(
                ValidationErrorKind::DuplicatePeriod,
                duplicates,
                "periods must be unique",
            )),
            Some(kind) => Err(DemandError::validation(
                kind,
                non_monotonic,
                "periods must be strictly increasing",
            )),
        }
    }

    fn fill_gaps(
        &self,
        records: &[Observation],
    ) -> Result<(Vec<Observation>, Vec<Replacement>)> {
        let gaps: Vec<usize> = records
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].period.months_until(&pair[1].period) > 1)
            .map(|(i, _)| i + 1)
            .collect();
        if gaps.is_empty() {
            return Ok((records.to_vec(), Vec::new()));
        }
        if !self.config.fill_gaps {
            return Err(DemandError::validation(
                ValidationErrorKind::PeriodGap,
                gaps,
                "months are missing and gap filling is disabled",
            ));
        }
        let too_long: Vec<usize> = gaps
            .iter()
            .copied()
            .filter(|&i| {
                let missing = records[i - 1].period.months_until(&records[i].period) - 1;
                missing > self.period as i64
            })
            .collect();
        if !too_long.is_empty() {
            return Err(DemandError::validation(
                ValidationErrorKind::PeriodGap,
                too_long,
                format!("gaps longer than {} months are not interpolated", self.period),
            ));
        }

        let mut filled = Vec::with_capacity(records.len());
        let mut replacements = Vec::new();
        for (i, obs) in records.iter().enumerate() {
            if let Some(prev) = i.checked_sub(1).map(|j| records[j]) {
                let span = prev.period.months_until(&obs.period);
                for step in 1..span {
                    let fraction = step as f64 / span as f64;
                    let value = prev.value + (obs.value - prev.value) * fraction;
                    let period = prev.period.offset(step);
                    replacements.push(Replacement {
                        index: filled.len(),
                        period,
                        original: None,
                        replacement: value,
                        cause: ReplacementCause::GapFill,
                    });
                    filled.push(Observation { period, value });
                }
            }
            filled.push(*obs);
        }
        info!(filled = replacements.len(), "Interpolated missing months");
        Ok((filled, replacements))
    }

    /// Flag points that stand out both from the local trend and from the
    /// same season in neighbouring cycles, then interpolate over them.
    fn replace_outliers(
        &self,
        observations: &mut [Observation],
        replacements: &mut Vec<Replacement>,
    ) {
        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
        let magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();
        let floor = SPREAD_FLOOR * stats::median(&magnitudes).max(1.0);
        let half = self.half_window();
        let multiplier = self.config.mad_multiplier;

        let off_trend = off_local_trend(&values, half, multiplier, floor);
        let off_season = off_seasonal_peers(&values, self.period, half, multiplier, floor);
        let flagged: Vec<bool> = off_trend
            .iter()
            .zip(&off_season)
            .map(|(&trend, &season)| trend && season)
            .collect();
        if !flagged.iter().any(|&f| f) {
            debug!(half_window = half, "No outliers found");
            return;
        }

        let mut count = 0;
        for i in 0..values.len() {
            if !flagged[i] {
                continue;
            }
            let prev = (0..i).rev().find(|&j| !flagged[j]);
            let next = (i + 1..values.len()).find(|&j| !flagged[j]);
            let replacement = match (prev, next) {
                (Some(a), Some(b)) => {
                    let fraction = (i - a) as f64 / (b - a) as f64;
                    values[a] + (values[b] - values[a]) * fraction
                }
                (Some(a), None) => values[a],
                (None, Some(b)) => values[b],
                (None, None) => continue,
            };
            observations[i].value = replacement;
            count += 1;
            match replacements.iter_mut().find(|r| r.index == i) {
                Some(existing) => existing.replacement = replacement,
                None => replacements.push(Replacement {
                    index: i,
                    period: observations[i].period,
                    original: Some(values[i]),
                    replacement,
                    cause: ReplacementCause::Outlier,
                }),
            }
        }
        info!(count, multiplier, "Replaced outliers");
    }

    /// Half-width of the screening window, which spans at least one cycle
    fn half_window(&self) -> usize {
        ((self.period + 1) / 2).max(MIN_HALF_WINDOW)
    }
}

/// `2 * half + 1` consecutive positions around `t`, shifted inward at the
/// ends of the series
fn window(t: usize, half: usize, n: usize) -> Range<usize> {
    let width = (2 * half + 1).min(n);
    let lo = t.saturating_sub(half).min(n - width);
    lo..lo + width
}

/// `value` lies more than `multiplier` scaled MADs from the median of
/// `neighbourhood`
fn is_extreme(value: f64, neighbourhood: &[f64], multiplier: f64, floor: f64) -> bool {
    let center = stats::median(neighbourhood);
    let spread = (stats::mad(neighbourhood, center) * MAD_SCALE).max(floor);
    (value - center).abs() > multiplier * spread
}

/// Residual screen against a Theil-Sen line through each point's window
fn off_local_trend(values: &[f64], half: usize, multiplier: f64, floor: f64) -> Vec<bool> {
    let n = values.len();
    (0..n)
        .map(|t| {
            let range = window(t, half, n);
            let xs: Vec<f64> = range.clone().map(|k| k as f64).collect();
            let ys = &values[range.clone()];
            let Some((intercept, slope)) = stats::theil_sen(&xs, ys) else {
                return false;
            };
            let residuals: Vec<f64> = xs
                .iter()
                .zip(ys)
                .map(|(x, y)| y - intercept - slope * x)
                .collect();
            is_extreme(residuals[t - range.start], &residuals, multiplier, floor)
        })
        .collect()
}

/// Value expected at `t` from the same season one cycle away: the mean of
/// both sides, else a straight line through two cycles on one side, else
/// the single neighbouring cycle.
fn seasonal_reference(values: &[f64], t: usize, period: usize) -> Option<f64> {
    let n = values.len();
    let back = t.checked_sub(period);
    let ahead = (t + period < n).then_some(t + period);
    match (back, ahead) {
        (Some(b), Some(a)) => Some((values[b] + values[a]) / 2.0),
        (None, Some(a)) if a + period < n => Some(2.0 * values[a] - values[a + period]),
        (Some(b), None) if b >= period => Some(2.0 * values[b] - values[b - period]),
        (None, Some(a)) => Some(values[a]),
        (Some(b), None) => Some(values[b]),
        (None, None) => None,
    }
}

/// Screen of the deviations from the seasonal reference. Points without a
/// reference cannot be cleared by it and are reported as extreme.
fn off_seasonal_peers(
    values: &[f64],
    period: usize,
    half: usize,
    multiplier: f64,
    floor: f64,
) -> Vec<bool> {
    let n = values.len();
    if period < 2 {
        return vec![true; n];
    }
    let deviations: Vec<Option<f64>> = (0..n)
        .map(|t| seasonal_reference(values, t, period).map(|r| values[t] - r))
        .collect();
    (0..n)
        .map(|t| {
            let Some(own) = deviations[t] else {
                return true;
            };
            let neighbourhood: Vec<f64> = deviations[window(t, half, n)]
                .iter()
                .flatten()
                .copied()
                .collect();
            is_extreme(own, &neighbourhood, multiplier, floor)
        })
        .collect()
}

impl Default for MadSeriesValidator {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl SeriesValidator for MadSeriesValidator {
    fn validate(&self, raw: &[RawObservation]) -> Result<ObservationSeries> {
        let records = Self::complete_records(raw)?;
        Self::check_order(&records)?;
        let (mut observations, mut replacements) = self.fill_gaps(&records)?;

        if observations.len() < self.min_length {
            return Err(DemandError::validation(
                ValidationErrorKind::InsufficientLength,
                Vec::new(),
                format!(
                    "need at least {} monthly observations, got {}",
                    self.min_length,
                    observations.len()
                ),
            ));
        }

        if self.config.enabled {
            self.replace_outliers(&mut observations, &mut replacements);
        }
        replacements.sort_by_key(|r| r.index);

        debug!(
            len = observations.len(),
            start = ?observations.first().map(|o| o.period),
            replacements = replacements.len(),
            "Series validated"
        );
        Ok(ObservationSeries::from_parts(observations, replacements))
    }
}
