//! Staggered solves of objectives with lagged terms.
//!
//! Lagged forms (friction forces, contact normals, regularization targets)
//! make the full coupled problem intractable for a single inner solve. The
//! staggered loop freezes the lagged state, minimizes the resulting
//! subproblem, refreshes the lagged state from the new minimizer, and repeats
//! until the composite gradient at the refreshed lag is small or the
//! iteration budget runs out.

mod energy;


pub use energy::EnergyProblem;

use weft_core::{RunContext, Vector, linalg};
use weft_forms::CompositeForm;

use crate::nonlinear;

/// Outer-loop settings for a staggered solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    max_lagging_iters: Option<usize>,
    tolerance: f64,
}

impl Config {
    /// Creates a config allowing at most `max_lagging_iters` lagging updates.
    ///
    /// `None` keeps updating until the tolerance is met.
    #[must_use]
    pub fn new(max_lagging_iters: Option<usize>, tolerance: f64) -> Self {
        Self {
            max_lagging_iters,
            tolerance,
        }
    }

    /// Returns the lagging update budget, if bounded.
    #[must_use]
    pub fn max_lagging_iters(&self) -> Option<usize> {
        self.max_lagging_iters
    }

    /// Returns the gradient norm at which the lagged state counts as converged.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Some(1), 1e-2)
    }
}

/// Indicates why the staggered loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The gradient at the refreshed lag met the tolerance, or nothing lags.
    Converged,

    /// The lagging update budget ran out.
    MaxLaggingIters,
}

/// The result of a staggered solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final status.
    pub status: Status,

    /// Minimizer of the last inner solve.
    pub x: Vector,

    /// Number of `update_lagging` calls.
    pub lagging_iters: usize,

    /// Total inner minimizer iterations.
    pub inner_iters: usize,

    /// Composite gradient norm after the last update, if any update ran.
    pub residual: Option<f64>,
}

/// Errors from a staggered solve.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("inner solve {lagging_iter} failed: {source}")]
    Inner {
        lagging_iter: usize,
        #[source]
        source: nonlinear::Error,
    },
}

/// Runs the staggered loop from `x0`.
///
/// Calls `init_lagging(x0)` on the objective, then alternates inner solves
/// with `update_lagging`.
///
/// # Errors
///
/// Returns an error if an inner solve fails.
pub fn solve(
    objective: &mut CompositeForm,
    x0: &Vector,
    config: &Config,
    inner: &nonlinear::Config,
    ctx: &RunContext,
) -> Result<Solution, Error> {
    let target = ctx.target();
    let inner = inner.clone().with_target(target);
    objective.init_lagging(x0);

    let mut x = x0.clone();
    let mut lagging_iters = 0;
    let mut inner_iters = 0;
    let mut residual = None;

    loop {
        let solution = nonlinear::minimize_unobserved(&mut EnergyProblem::new(objective), &x, &inner)
            .map_err(|source| Error::Inner {
                lagging_iter: lagging_iters,
                source,
            })?;
        inner_iters += solution.iters;
        x = solution.x;
        log::debug!(
            target: target,
            "inner solve {lagging_iters}: {:?} after {} iterations, energy {:.6e}",
            solution.status,
            solution.iters,
            solution.value
        );

        if !objective.uses_lagging() {
            return Ok(finish(Status::Converged, x, lagging_iters, inner_iters, residual, target));
        }
        if config.max_lagging_iters.is_some_and(|max| lagging_iters >= max) {
            return Ok(finish(Status::MaxLaggingIters, x, lagging_iters, inner_iters, residual, target));
        }

        objective.update_lagging(&x);
        lagging_iters += 1;

        let norm = linalg::norm(&objective.gradient(&x));
        residual = Some(norm);
        log::debug!(target: target, "lagging iteration {lagging_iters}: residual {norm:.3e}");
        if norm <= config.tolerance {
            return Ok(finish(Status::Converged, x, lagging_iters, inner_iters, residual, target));
        }
    }
}

fn finish(
    status: Status,
    x: Vector,
    lagging_iters: usize,
    inner_iters: usize,
    residual: Option<f64>,
    target: &str,
) -> Solution {
    log::info!(
        target: target,
        "staggered solve finished: {status:?} after {lagging_iters} lagging iterations"
    );
    Solution {
        status,
        x,
        lagging_iters,
        inner_iters,
        residual,
    }
}
