//! Trait for raw series validation

use crate::error::Result;
use crate::model::{ObservationSeries, RawObservation};

/// Normalises raw monthly records into a validated series.
pub trait SeriesValidator: Send + Sync {
    /// Validate `raw`, filling gaps and replacing outliers as configured.
    fn validate(&self, raw: &[RawObservation]) -> Result<ObservationSeries>;
}
