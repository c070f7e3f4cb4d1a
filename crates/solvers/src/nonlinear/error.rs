use weft_core::ProblemError;

/// Errors that end a minimization run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The problem could not be evaluated at the starting point.
    #[error("initial point is not admissible: {0}")]
    InvalidStart(#[source] ProblemError),

    /// The problem failed with a non-recoverable error.
    #[error("problem error: {0}")]
    Problem(#[from] ProblemError),

    /// No trial step along the negative gradient decreased the objective.
    #[error("line search failed in iteration {iter} (minimum step size {min_step_size})")]
    LineSearchFailed { iter: usize, min_step_size: f64 },
}
