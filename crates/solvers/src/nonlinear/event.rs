use weft_core::{ProblemError, Vector};

/// Events emitted by the minimizer.
#[derive(Debug)]
pub enum Event<'a> {
    /// A trial point was rejected by the problem; the step will shrink.
    Rejected {
        /// The iteration the line search belongs to.
        iter: usize,

        /// The rejected step fraction.
        step: f64,

        /// The rejection reported by the problem.
        error: &'a ProblemError,
    },

    /// An iteration accepted a new point.
    Iterated {
        /// The iteration number, starting at 1.
        iter: usize,

        /// The accepted point.
        x: &'a Vector,

        /// Objective value at `x`.
        value: f64,

        /// Gradient norm at `x`.
        grad_norm: f64,

        /// The accepted step fraction.
        step: f64,
    },
}

impl Event<'_> {
    /// Returns the iteration the event belongs to.
    #[must_use]
    pub fn iter(&self) -> usize {
        match self {
            Self::Rejected { iter, .. } | Self::Iterated { iter, .. } => *iter,
        }
    }
}
