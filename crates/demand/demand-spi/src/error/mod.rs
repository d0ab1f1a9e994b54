//! Error module containing error types and result aliases

mod demand_error;

pub use demand_error::{DemandError, ValidationErrorKind};

/// Result type alias for demand pipeline operations
pub type Result<T> = std::result::Result<T, DemandError>;
