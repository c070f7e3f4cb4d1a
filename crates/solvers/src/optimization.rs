//! Design optimization over a parameterized forward solve.
//!
//! An [`OptimizationProblem`] turns a design vector `x` into an objective
//! value and gradient a generic minimizer can use:
//!
//! 1. the [`CompositeParameterization`](weft_params::CompositeParameterization)
//!    maps `x` to a physical field
//! 2. the [`ForwardSolve`](weft_core::ForwardSolve) maps the field to a state
//! 3. the objective [`CompositeForm`](weft_forms::CompositeForm) is evaluated
//!    on the state, plus an optional regularization on the field
//! 4. the gradient is pulled back through the adjoint solve and then through
//!    the parameterization chain in reverse
//!
//! Forward-solve failures become [`ProblemError::Rejected`], so a line search
//! responds to them by shrinking the step instead of aborting the run.
//!
//! [`ProblemError::Rejected`]: weft_core::ProblemError::Rejected

mod checkpoint;
mod error;
mod problem;

#[cfg(test)]
mod tests;

pub use checkpoint::{Checkpoint, CheckpointError, JsonLines, Record};
pub use error::Error;
pub use problem::OptimizationProblem;
