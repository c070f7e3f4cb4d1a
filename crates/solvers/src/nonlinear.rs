//! Gradient-based minimization of a [`Problem`].
//!
//! # Algorithm
//!
//! Each iteration picks a search direction, then runs a line search along it:
//!
//! - [`Method::GradientDescent`] steps along the negative gradient
//! - [`Method::Lbfgs`] applies a limited-memory inverse Hessian estimate built
//!   from the last few accepted steps
//! - [`Method::Newton`] solves `H d = -g` with a sparse LDLᵀ factorization
//!
//! Whenever a direction cannot be computed or does not descend, the iteration
//! falls back to the negative gradient. If a line search along a
//! quasi-Newton or Newton direction fails, it is retried once along the
//! negative gradient before the run gives up.
//!
//! # Rejections
//!
//! A [`ProblemError::Rejected`](weft_core::ProblemError::Rejected) from a trial
//! point is never fatal: the line search halves the step and tries again. The
//! trial step also starts at the problem's
//! [`max_step_size`](weft_core::Problem::max_step_size) and skips trial points
//! for which [`is_step_valid`](weft_core::Problem::is_step_valid) is `false`.
//!
//! # Observer Events
//!
//! - [`Event::Rejected`] — a trial point was rejected by the problem
//! - [`Event::Iterated`] — an iteration accepted a new point
//!
//! Observers can return [`Action::StopEarly`] after either event.

mod action;
mod config;
mod direction;
mod error;
mod event;
mod line_search;
mod solution;


pub use action::Action;
pub use config::{Config, ConfigError, LineSearch, Method};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use weft_core::{Observer, Problem, Vector, linalg};

use direction::{Direction, DirectionKind};
use line_search::{Accepted, Outcome, line_search};

/// Minimizes `problem` starting from `x0`.
///
/// See the [module docs](self) for the algorithm and observer events.
///
/// # Errors
///
/// Returns an error if the problem rejects `x0`, fails with a non-rejection
/// error, or no admissible decrease exists along the negative gradient.
pub fn minimize<P, Obs>(
    problem: &mut P,
    x0: &Vector,
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    P: Problem + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let mut x = x0.clone();
    problem.solution_changed(&x);
    let mut value = problem.value(&x).map_err(Error::InvalidStart)?;
    let mut grad = problem.gradient(&x).map_err(Error::InvalidStart)?;
    let target = config.target();
    let mut direction = Direction::new(config.method());

    for iter in 1..=config.max_iters() {
        let grad_norm = linalg::norm(&grad);
        if grad_norm <= config.grad_norm_tol() {
            return Ok(Solution::new(Status::Converged, x, value, grad_norm, iter - 1));
        }
        if problem.stop(&x) {
            return Ok(Solution::new(Status::StoppedByProblem, x, value, grad_norm, iter - 1));
        }

        let (dir, kind) = direction.compute(problem, &x, &grad, target)?;
        let mut outcome = line_search(problem, &x, value, &grad, &dir, config, iter, &mut observer)?;
        if matches!(outcome, Outcome::Exhausted) && kind != DirectionKind::Gradient {
            log::debug!(target: target, "iteration {iter}: {kind:?} step failed, retrying along the gradient");
            direction.reset();
            let steepest = -&grad;
            outcome = line_search(problem, &x, value, &grad, &steepest, config, iter, &mut observer)?;
        }

        let Accepted {
            x: x_next,
            value: value_next,
            step,
        } = match outcome {
            Outcome::Accepted(accepted) => accepted,
            Outcome::Stopped => {
                return Ok(Solution::new(Status::StoppedByObserver, x, value, grad_norm, iter));
            }
            Outcome::Exhausted => {
                return Err(Error::LineSearchFailed {
                    iter,
                    min_step_size: config.min_step_size(),
                });
            }
        };

        let grad_next = problem.gradient(&x_next)?;
        direction.record(&(&x_next - &x), &(&grad_next - &grad));
        let delta = (value - value_next).abs();

        x = x_next;
        problem.solution_changed(&x);
        problem.post_step(iter, &x);

        // Lagged terms may have moved in `post_step`.
        value = problem.value(&x)?;
        grad = problem.gradient(&x)?;
        let grad_norm = linalg::norm(&grad);

        log::debug!(
            target: target,
            "iteration {iter}: f = {value:.6e}, |g| = {grad_norm:.3e}, step = {step:.3e} ({kind:?})"
        );

        let event = Event::Iterated {
            iter,
            x: &x,
            value,
            grad_norm,
            step,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(Solution::new(Status::StoppedByObserver, x, value, grad_norm, iter));
        }

        if delta <= config.f_delta_tol() {
            return Ok(Solution::new(Status::Converged, x, value, grad_norm, iter));
        }
    }

    let grad_norm = linalg::norm(&grad);
    let status = if grad_norm <= config.grad_norm_tol() {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::new(status, x, value, grad_norm, config.max_iters()))
}

/// Minimizes `problem` without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// See [`minimize`].
pub fn minimize_unobserved<P>(problem: &mut P, x0: &Vector, config: &Config) -> Result<Solution, Error>
where
    P: Problem + ?Sized,
{
    minimize(problem, x0, config, ())
}
