//! Demand pipeline error types
//!
//! Every error carries enough structured context (offending indices, attempted
//! orders, last statistic values) for a caller to render a precise diagnostic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Order, PipelineStage, RejectionReason, SeasonalOrder};

/// Category of a series validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// A record has no period or no finite value
    MissingField,
    /// A period precedes the period before it
    NonMonotonicPeriod,
    /// The same period appears twice in a row
    DuplicatePeriod,
    /// Fewer observations than two full seasonal cycles
    InsufficientLength,
    /// Whole months are missing and gap filling is disabled
    PeriodGap,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationErrorKind::MissingField => "missing field",
            ValidationErrorKind::NonMonotonicPeriod => "non-monotonic period",
            ValidationErrorKind::DuplicatePeriod => "duplicate period",
            ValidationErrorKind::InsufficientLength => "insufficient length",
            ValidationErrorKind::PeriodGap => "period gap",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while running the demand pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DemandError {
    /// The raw series could not be normalised into an observation series
    #[error("Validation failed ({kind}) at indices {indices:?}: {message}")]
    Validation {
        kind: ValidationErrorKind,
        indices: Vec<usize>,
        message: String,
    },

    /// The series has zero variance, so correlation is undefined
    #[error("Degenerate series: all {len} values equal {value}")]
    DegenerateSeries { len: usize, value: f64 },

    /// The unit-root test still fails after the maximum number of differences
    #[error(
        "Series is non-stationary after {max_differencing} differences \
         (ADF statistic {statistic:.4}, p-value {p_value:.4})"
    )]
    NonStationaryAfterMaxDifferencing {
        max_differencing: usize,
        statistic: f64,
        p_value: f64,
    },

    /// Every candidate in the searched neighbourhood was rejected
    #[error("No viable model: all {} searched candidates were rejected", .attempted.len())]
    NoViableModel {
        attempted: Vec<(Order, SeasonalOrder)>,
        reasons: Vec<RejectionReason>,
    },

    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter or configuration value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A pipeline stage was requested out of order
    #[error("Cannot run stage '{requested}' while the pipeline is at '{current}'")]
    InvalidStageTransition {
        current: PipelineStage,
        requested: PipelineStage,
    },
}

impl DemandError {
    /// Build a validation error
    pub fn validation(
        kind: ValidationErrorKind,
        indices: Vec<usize>,
        message: impl Into<String>,
    ) -> Self {
        DemandError::Validation {
            kind,
            indices,
            message: message.into(),
        }
    }

    /// Build an invalid parameter error
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DemandError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Validation kind, if this is a validation error
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            DemandError::Validation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
