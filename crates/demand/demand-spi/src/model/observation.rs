//! Observation records and the validated monthly series.

use serde::{Deserialize, Serialize};

use super::YearMonth;

/// One input record as supplied by the caller; either field may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Month label.
    pub period: Option<YearMonth>,
    /// Demand value.
    pub value: Option<f64>,
}

impl RawObservation {
    /// A complete record.
    pub fn new(period: YearMonth, value: f64) -> Self {
        Self {
            period: Some(period),
            value: Some(value),
        }
    }
}

/// A validated monthly observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Month label.
    pub period: YearMonth,
    /// Demand value, always finite.
    pub value: f64,
}

/// Why a value in the validated series differs from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacementCause {
    /// The input value was flagged as an outlier.
    Outlier,
    /// The month was absent from the input and has been interpolated.
    GapFill,
}

/// A single value substituted during validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Replacement {
    /// Position in the validated series.
    pub index: usize,
    /// Month of the replaced value.
    pub period: YearMonth,
    /// Input value, `None` for filled gaps.
    pub original: Option<f64>,
    /// Value used in the validated series.
    pub replacement: f64,
    /// Reason for the substitution.
    pub cause: ReplacementCause,
}

/// Contiguous, strictly increasing monthly series with finite values.
///
/// Constructed by a [`SeriesValidator`](crate::SeriesValidator); the
/// replacement log records every value that differs from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
    replacements: Vec<Replacement>,
}

impl ObservationSeries {
    /// Assemble a series from validated parts.
    pub fn from_parts(observations: Vec<Observation>, replacements: Vec<Replacement>) -> Self {
        Self {
            observations,
            replacements,
        }
    }

    /// Build a contiguous series starting at `start` from plain values.
    pub fn from_values(start: YearMonth, values: &[f64]) -> Self {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                period: start.offset(i as i64),
                value,
            })
            .collect();
        Self::from_parts(observations, Vec::new())
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Values in period order.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// Periods in order.
    pub fn periods(&self) -> Vec<YearMonth> {
        self.observations.iter().map(|o| o.period).collect()
    }

    pub fn start(&self) -> Option<YearMonth> {
        self.observations.first().map(|o| o.period)
    }

    pub fn end(&self) -> Option<YearMonth> {
        self.observations.last().map(|o| o.period)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Every substitution made during validation, in index order.
    pub fn replacements(&self) -> &[Replacement] {
        &self.replacements
    }

    /// Positions whose input value was replaced as an outlier.
    pub fn outlier_positions(&self) -> Vec<usize> {
        self.replacements
            .iter()
            .filter(|r| r.cause == ReplacementCause::Outlier)
            .map(|r| r.index)
            .collect()
    }

    /// The first `len` observations as a new series, keeping matching replacements.
    pub fn head(&self, len: usize) -> Self {
        let len = len.min(self.observations.len());
        Self {
            observations: self.observations[..len].to_vec(),
            replacements: self
                .replacements
                .iter()
                .filter(|r| r.index < len)
                .copied()
                .collect(),
        }
    }
}
