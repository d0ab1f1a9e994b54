//! Additive decomposition result.

use serde::{Deserialize, Serialize};

use super::YearMonth;

/// Trend, seasonal and residual components of a series.
///
/// `trend` and `residual` are `None` on the boundary months that lack a
/// full centered moving-average window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    /// Seasonal period used.
    pub period: usize,
    /// Centered moving-average trend.
    pub trend: Vec<Option<f64>>,
    /// Seasonal component, defined everywhere.
    pub seasonal: Vec<f64>,
    /// Remainder after trend and seasonal removal.
    pub residual: Vec<Option<f64>>,
    /// One index per cycle position, summing to approximately zero.
    ///
    /// Positions count from the first observation, so index 0 belongs to the
    /// series' first month rather than to January. Use
    /// [`Decomposition::seasonal_index_for`] to look up a calendar month.
    pub seasonal_indices: Vec<f64>,
    /// `1 - Var(residual) / Var(seasonal + residual)`, clamped to [0, 1].
    pub seasonal_strength: f64,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.seasonal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seasonal.is_empty()
    }

    /// Number of positions with a defined trend.
    pub fn defined_len(&self) -> usize {
        self.trend.iter().filter(|t| t.is_some()).count()
    }

    /// Seasonal index of `month` in a series that starts at `start`.
    pub fn seasonal_index_for(&self, start: YearMonth, month: YearMonth) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        let position = start.months_until(&month).rem_euclid(self.period as i64);
        self.seasonal_indices.get(position as usize).copied()
    }

    /// Reassembled value at `index`, if the trend is defined there.
    pub fn reconstruct(&self, index: usize) -> Option<f64> {
        let trend = (*self.trend.get(index)?)?;
        let residual = (*self.residual.get(index)?)?;
        Some(trend + self.seasonal[index] + residual)
    }
}
