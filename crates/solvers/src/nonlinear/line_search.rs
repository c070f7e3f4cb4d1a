use weft_core::{Observer, Problem, Vector};

use super::{Action, Config, Error, Event, LineSearch};

/// Sufficient decrease constant for the Armijo rule.
const ARMIJO_C1: f64 = 1e-4;

pub(super) struct Accepted {
    pub(super) x: Vector,
    pub(super) value: f64,
    pub(super) step: f64,
}

pub(super) enum Outcome {
    Accepted(Accepted),
    Exhausted,
    Stopped,
}

/// Halves the step along `dir` until a trial point is admissible and passes
/// the configured acceptance rule.
///
/// Brackets the trials with `line_search_begin`/`line_search_end`. Rejected
/// and invalid trials shrink the step; any other problem error is returned.
#[allow(clippy::too_many_arguments)]
pub(super) fn line_search<P, Obs>(
    problem: &mut P,
    x: &Vector,
    value: f64,
    grad: &Vector,
    dir: &Vector,
    config: &Config,
    iter: usize,
    observer: &mut Obs,
) -> Result<Outcome, Error>
where
    P: Problem + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let full = x + dir;
    let slope = grad.dot(dir);
    let mut step = problem.max_step_size(x, &full).clamp(0.0, 1.0);
    problem.line_search_begin(x, &full);

    let outcome = search(problem, x, value, slope, dir, config, iter, observer, &mut step);
    problem.line_search_end();
    outcome
}

#[allow(clippy::too_many_arguments)]
fn search<P, Obs>(
    problem: &mut P,
    x: &Vector,
    value: f64,
    slope: f64,
    dir: &Vector,
    config: &Config,
    iter: usize,
    observer: &mut Obs,
    step: &mut f64,
) -> Result<Outcome, Error>
where
    P: Problem + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let target = config.target();
    for _ in 0..config.max_line_search_iters() {
        if *step <= config.min_step_size() {
            break;
        }

        let trial = x + &(dir * *step);
        if !problem.is_step_valid(x, &trial) {
            log::trace!(target: target, "iteration {iter}: step {step:.3e} leaves the admissible region");
            *step *= 0.5;
            continue;
        }

        match problem.value(&trial) {
            Ok(trial_value) if accepts(config.line_search(), value, trial_value, *step, slope) => {
                return Ok(Outcome::Accepted(Accepted {
                    x: trial,
                    value: trial_value,
                    step: *step,
                }));
            }
            Ok(trial_value) => {
                log::trace!(target: target, "iteration {iter}: step {step:.3e} gives f = {trial_value:.6e}");
            }
            Err(error) if error.is_rejection() => {
                log::warn!(target: target, "iteration {iter}: step {step:.3e} rejected: {error}");
                let event = Event::Rejected {
                    iter,
                    step: *step,
                    error: &error,
                };
                if let Some(Action::StopEarly) = observer.observe(&event) {
                    return Ok(Outcome::Stopped);
                }
            }
            Err(error) => return Err(error.into()),
        }
        *step *= 0.5;
    }

    Ok(Outcome::Exhausted)
}

fn accepts(rule: LineSearch, value: f64, trial: f64, step: f64, slope: f64) -> bool {
    if !trial.is_finite() {
        return false;
    }
    match rule {
        LineSearch::Backtracking => trial <= value,
        LineSearch::Armijo => trial <= value + ARMIJO_C1 * step * slope,
    }
}
