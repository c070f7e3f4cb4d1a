use thiserror::Error;

use crate::{Hessian, Vector};

/// Errors a [`Problem`] reports to the optimizer driving it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProblemError {
    /// No admissible point exists at the requested `x`.
    ///
    /// Recoverable: a line search treats this as an instruction to shrink
    /// the step.
    #[error("inadmissible point: {reason}")]
    Rejected { reason: String },

    /// The problem does not implement the requested operation.
    #[error("{operation} is not supported by this problem")]
    Unsupported { operation: &'static str },
}

impl ProblemError {
    /// Creates a [`ProblemError::Rejected`] with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error only rejects the current point.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// The contract a generic nonlinear optimizer drives.
///
/// Evaluation methods take `&mut self` so implementations can cache work
/// shared between value, gradient and Hessian queries at the same `x`. The
/// lifecycle hooks are called by the optimizer in this order for every
/// iteration: `max_step_size` and `line_search_begin` before the trial
/// points are evaluated, `is_step_valid` per trial, `line_search_end` once
/// the search finishes, then `solution_changed` and `post_step` for the
/// accepted point.
pub trait Problem {
    /// Computes the objective at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Rejected`] if `x` is not admissible.
    fn value(&mut self, x: &Vector) -> Result<f64, ProblemError>;

    /// Computes the objective gradient at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Rejected`] if `x` is not admissible.
    fn gradient(&mut self, x: &Vector) -> Result<Vector, ProblemError>;

    /// Computes the objective Hessian at `x`.
    ///
    /// # Errors
    ///
    /// The default implementation returns [`ProblemError::Unsupported`].
    fn hessian(&mut self, _x: &Vector) -> Result<Hessian, ProblemError> {
        Err(ProblemError::Unsupported {
            operation: "hessian",
        })
    }

    /// Returns `false` if the step `x0 -> x1` must not be taken.
    fn is_step_valid(&self, _x0: &Vector, _x1: &Vector) -> bool {
        true
    }

    /// Returns the largest admissible fraction of the step `x0 -> x1`.
    fn max_step_size(&self, _x0: &Vector, _x1: &Vector) -> f64 {
        1.0
    }

    /// Called before a line search from `x0` toward `x1` begins.
    fn line_search_begin(&mut self, _x0: &Vector, _x1: &Vector) {}

    /// Called after a line search finishes, accepted or not.
    fn line_search_end(&mut self) {}

    /// Called after iteration `iter` accepted `x`.
    fn post_step(&mut self, _iter: usize, _x: &Vector) {}

    /// Called whenever the accepted `x` changes.
    ///
    /// Implementations must refresh any state cached from a previous `x`.
    fn solution_changed(&mut self, x: &Vector);

    /// Domain-specific convergence hook; `true` ends the run.
    fn stop(&self, _x: &Vector) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_is_recoverable() {
        let err = ProblemError::rejected("forward solve diverged");
        assert!(err.is_rejection());
        assert_eq!(err.to_string(), "inadmissible point: forward solve diverged");

        let err = ProblemError::Unsupported {
            operation: "hessian",
        };
        assert!(!err.is_rejection());
    }
}
