use thiserror::Error;

/// Errors raised while constructing a concrete parameterization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("{stage}: {parameter} must be finite and nonzero, got {value}")]
    InvalidParameter {
        stage: &'static str,
        parameter: &'static str,
        value: f64,
    },

    #[error("bounds must satisfy lower < upper, got [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("{stage}: index {index} is out of range for size {size}")]
    IndexOutOfRange {
        stage: &'static str,
        index: usize,
        size: usize,
    },

    #[error("{stage}: index {index} appears more than once")]
    DuplicateIndex { stage: &'static str, index: usize },
}
