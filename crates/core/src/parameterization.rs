use thiserror::Error;

use crate::Vector;

/// A pure, differentiable map `f: x -> y` with reverse-mode propagation.
///
/// Implementations hold only fixed construction-time parameters. Every method
/// is a function of its explicit arguments, so a parameterization can be
/// shared between optimization runs without leaking state.
pub trait Parameterization {
    /// Short, human-readable name used in error and log messages.
    fn name(&self) -> &str;

    /// Reports the output dimension for an input of dimension `x_size`.
    ///
    /// Performs no computation; used to validate chains at construction.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionError`] if this map does not accept `x_size` inputs.
    fn size(&self, x_size: usize) -> Result<usize, DimensionError>;

    /// Evaluates the forward map.
    fn eval(&self, x: &Vector) -> Vector;

    /// Propagates a gradient from the output back to the input.
    ///
    /// Given `grad_y`, the gradient of some scalar with respect to
    /// `eval(x)`, returns the gradient of the same scalar with respect to
    /// `x`, i.e. `J(x)ᵀ · grad_y`.
    fn apply_jacobian(&self, grad_y: &Vector, x: &Vector) -> Vector;

    /// Evaluates the inverse map, if one exists.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`ParamError::Unsupported`].
    fn inverse_eval(&self, _y: &Vector) -> Result<Vector, ParamError> {
        Err(ParamError::Unsupported {
            operation: "inverse_eval",
            stage: self.name().to_owned(),
        })
    }
}

/// A map received an input whose length it cannot handle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("expected input of size {expected}, found {found}")]
pub struct DimensionError {
    pub expected: usize,
    pub found: usize,
}

/// Errors raised by parameterizations and parameterization chains.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    /// The requested operation is not implemented by this stage.
    #[error("{operation} is not supported by {stage}")]
    Unsupported {
        operation: &'static str,
        stage: String,
    },

    /// Adjacent stages of a chain disagree on dimensions.
    #[error("stage {index} ({stage}) rejects its input: {source}")]
    DimensionMismatch {
        index: usize,
        stage: String,
        #[source]
        source: DimensionError,
    },

    /// An inverse was requested for a value outside the map's range.
    #[error("{stage} cannot invert entry {index} with value {value}")]
    OutOfRange {
        stage: String,
        index: usize,
        value: f64,
    },
}
