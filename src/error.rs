use thiserror::Error;

use crate::estimator::Correlation;

/// Failures of a single permeability estimate. None of them are retryable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// Porosity out of range, or a curve missing its normalization volume.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient data: {valid} valid curve point(s) after cleaning, need at least 2")]
    InsufficientData { valid: usize },

    /// A correlation's base value is non-positive (or not finite).
    #[error("{formula} permeability is undefined for base value {base}")]
    Domain { formula: Correlation, base: f64 },
}

pub type Result<T> = std::result::Result<T, EstimateError>;
