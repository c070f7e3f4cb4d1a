use std::collections::VecDeque;

use sprs::{FillInReduction, SymmetryCheck};
use sprs_ldl::Ldl;
use weft_core::{Problem, ProblemError, Vector, linalg};

use super::{Error, Method};

/// Number of step pairs kept by L-BFGS.
const LBFGS_HISTORY: usize = 6;

/// Which rule produced a search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DirectionKind {
    Gradient,
    Lbfgs,
    Newton,
}

/// Search direction state carried across iterations.
pub(super) enum Direction {
    Gradient,
    Lbfgs(VecDeque<Pair>),
    Newton,
}

/// One accepted step `s = x1 - x0` with gradient change `y = g1 - g0`.
pub(super) struct Pair {
    s: Vector,
    y: Vector,
    rho: f64,
}

impl Direction {
    pub(super) fn new(method: Method) -> Self {
        match method {
            Method::GradientDescent => Self::Gradient,
            Method::Lbfgs => Self::Lbfgs(VecDeque::with_capacity(LBFGS_HISTORY)),
            Method::Newton => Self::Newton,
        }
    }

    /// Computes a descent direction at `x`.
    ///
    /// Falls back to `-grad` when the preferred direction is unavailable or
    /// does not descend.
    pub(super) fn compute<P: Problem + ?Sized>(
        &mut self,
        problem: &mut P,
        x: &Vector,
        grad: &Vector,
        target: &str,
    ) -> Result<(Vector, DirectionKind), Error> {
        let preferred = match self {
            Self::Gradient => None,
            Self::Lbfgs(history) => {
                (!history.is_empty()).then(|| (two_loop(history, grad), DirectionKind::Lbfgs))
            }
            Self::Newton => newton(problem, x, grad, target)?.map(|dir| (dir, DirectionKind::Newton)),
        };

        match preferred {
            Some((dir, kind)) if dir.dot(grad) < 0.0 => Ok((dir, kind)),
            Some((_, kind)) => {
                log::debug!(target: target, "{kind:?} direction is not a descent direction, using the gradient");
                self.reset();
                Ok((-grad, DirectionKind::Gradient))
            }
            None => Ok((-grad, DirectionKind::Gradient)),
        }
    }

    /// Records an accepted step for quasi-Newton updates.
    pub(super) fn record(&mut self, s: &Vector, y: &Vector) {
        if let Self::Lbfgs(history) = self {
            let sy = s.dot(y);
            if sy <= f64::EPSILON * linalg::norm(s) * linalg::norm(y) {
                return;
            }
            if history.len() == LBFGS_HISTORY {
                history.pop_front();
            }
            history.push_back(Pair {
                s: s.clone(),
                y: y.clone(),
                rho: 1.0 / sy,
            });
        }
    }

    /// Forgets curvature history.
    pub(super) fn reset(&mut self) {
        if let Self::Lbfgs(history) = self {
            history.clear();
        }
    }
}

/// Two-loop recursion for `-H⁻¹ grad` with the scaled identity as initial estimate.
fn two_loop(history: &VecDeque<Pair>, grad: &Vector) -> Vector {
    let mut q = grad.clone();
    let mut alphas = Vec::with_capacity(history.len());

    for pair in history.iter().rev() {
        let alpha = pair.rho * pair.s.dot(&q);
        q.scaled_add(-alpha, &pair.y);
        alphas.push(alpha);
    }

    if let Some(last) = history.back() {
        let gamma = last.s.dot(&last.y) / last.y.dot(&last.y);
        q *= gamma;
    }

    for (pair, alpha) in history.iter().zip(alphas.into_iter().rev()) {
        let beta = pair.rho * pair.y.dot(&q);
        q.scaled_add(alpha - beta, &pair.s);
    }

    -q
}

/// Solves `H d = -grad`, or returns `None` if the Hessian cannot be factored.
///
/// A single unknown is solved directly, since the sparse LDLᵀ factorization
/// needs at least two rows.
fn newton<P: Problem + ?Sized>(
    problem: &mut P,
    x: &Vector,
    grad: &Vector,
    target: &str,
) -> Result<Option<Vector>, Error> {
    let hessian = match problem.hessian(x) {
        Ok(hessian) => hessian,
        Err(ProblemError::Rejected { reason }) => {
            log::debug!(target: target, "hessian rejected ({reason}), using the gradient");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    if grad.len() <= 1 {
        let curvature = hessian.get(0, 0).copied().unwrap_or(0.0);
        if !curvature.is_finite() || curvature <= 0.0 {
            log::debug!(target: target, "hessian is not positive ({curvature:e}), using the gradient");
            return Ok(None);
        }
        return Ok(Some(grad / -curvature));
    }

    let ldl = match Ldl::new()
        .fill_in_reduction(FillInReduction::ReverseCuthillMcKee)
        .check_symmetry(SymmetryCheck::DontCheckSymmetry)
        .numeric(hessian.view())
    {
        Ok(ldl) => ldl,
        Err(err) => {
            log::debug!(target: target, "hessian factorization failed ({err}), using the gradient");
            return Ok(None);
        }
    };

    let rhs: Vec<f64> = grad.iter().map(|g| -g).collect();
    let dir = Vector::from(ldl.solve(rhs.as_slice()));
    Ok(dir.iter().all(|v| v.is_finite()).then_some(dir))
}
