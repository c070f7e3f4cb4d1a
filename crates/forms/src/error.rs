use thiserror::Error;

use weft_core::WeightError;

/// Errors raised while constructing forms and weight policies.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormError {
    #[error("a composite form needs at least one member")]
    Empty,

    #[error("{form}: {parameter} must be positive and finite, got {value}")]
    InvalidParameter {
        form: &'static str,
        parameter: &'static str,
        value: f64,
    },

    #[error("{form}: expected dimension {expected}, found {found}")]
    DimensionMismatch {
        form: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{form}: index {index} is out of range for dimension {size}")]
    IndexOutOfRange {
        form: &'static str,
        index: usize,
        size: usize,
    },

    #[error("initial weight {initial} exceeds maximum weight {max}")]
    InvalidSchedule { initial: f64, max: f64 },

    #[error(transparent)]
    Weight(#[from] WeightError),
}

/// Returns `value` if it is finite and strictly positive.
pub(crate) fn positive(
    form: &'static str,
    parameter: &'static str,
    value: f64,
) -> Result<f64, FormError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FormError::InvalidParameter {
            form,
            parameter,
            value,
        })
    }
}
