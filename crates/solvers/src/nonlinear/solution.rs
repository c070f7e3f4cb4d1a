use weft_core::Vector;

/// Indicates why the minimizer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged on the gradient norm or function delta tolerance.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// Stopped early due to an observer decision.
    StoppedByObserver,

    /// The problem's own stopping rule ended the run.
    StoppedByProblem,
}

/// The result of a minimization run.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Last accepted point.
    pub x: Vector,

    /// Objective value at `x`.
    pub value: f64,

    /// Gradient norm at `x`.
    pub grad_norm: f64,

    /// Number of completed iterations.
    pub iters: usize,
}

impl Solution {
    pub(super) fn new(status: Status, x: Vector, value: f64, grad_norm: f64, iters: usize) -> Self {
        Self {
            status,
            x,
            value,
            grad_norm,
            iters,
        }
    }
}
