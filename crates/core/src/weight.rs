use thiserror::Error;

/// A finite, non-negative scalar weight applied to a form.
///
/// The invariant is checked once at construction, so code holding a `Weight`
/// can multiply by it without re-validating.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(f64);

/// Error returned when a weight is negative or not finite.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("weight must be finite and non-negative, got {0}")]
pub struct WeightError(pub f64);

impl Weight {
    /// The unit weight.
    pub const ONE: Self = Self(1.0);

    /// Creates a weight, rejecting negative or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`WeightError`] if `value` is negative, NaN, or infinite.
    pub fn new(value: f64) -> Result<Self, WeightError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Self(value))
        } else {
            Err(WeightError(value))
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Weight {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<f64> for Weight {
    type Error = WeightError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
