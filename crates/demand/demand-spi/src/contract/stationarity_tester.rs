//! Trait for unit-root testing and differencing-order selection

use crate::error::Result;
use crate::model::StationarityReport;

/// Determines how many differences make a series stationary.
pub trait StationarityTester: Send + Sync {
    /// Test `values`, differencing until stationary or the bound is reached.
    fn test(&self, values: &[f64]) -> Result<StationarityReport>;

    /// Test the differenced output of a previous report again.
    ///
    /// The returned order counts the differences already applied in `prior`.
    fn retest(&self, prior: &StationarityReport) -> Result<StationarityReport>;
}
