//! Trait for seasonal decomposition

use crate::error::Result;
use crate::model::Decomposition;

/// Splits a series into trend, seasonal and residual components.
pub trait Decomposer: Send + Sync {
    /// Decompose `values` with seasonal period `period`.
    fn decompose(&self, values: &[f64], period: usize) -> Result<Decomposition>;
}
