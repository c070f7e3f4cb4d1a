use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use approx::assert_relative_eq;
use ndarray::array;
use thiserror::Error;

use weft_core::{
    DimensionError, ForwardSolve, ParamError, Problem, ProblemError, RunContext, Vector, Weight,
};
use weft_forms::{AugmentedLagrangianForm, CompositeForm, LaggedRegForm};
use weft_params::{Affine, CompositeParameterization, Exp, Scatter, SharedStage};

use super::{Error, JsonLines, OptimizationProblem, Record};
use crate::nonlinear::{self, Method, Status};

/// Independent springs: state `u = f / k` for stiffness field `k`.
struct Springs {
    load: Vector,
    solves: Cell<usize>,
    warm_starts: RefCell<Vec<Option<Vector>>>,
}

impl Springs {
    fn new(load: Vector) -> Self {
        Self {
            load,
            solves: Cell::new(0),
            warm_starts: RefCell::new(Vec::new()),
        }
    }
}

#[derive(Debug, Error)]
#[error("spring {0} has non-positive stiffness")]
struct Collapsed(usize);

impl ForwardSolve for Springs {
    type Error = Collapsed;

    fn field_size(&self) -> usize {
        self.load.len()
    }

    fn solve(&self, field: &Vector, warm_start: Option<&Vector>) -> Result<Vector, Collapsed> {
        self.solves.set(self.solves.get() + 1);
        self.warm_starts.borrow_mut().push(warm_start.cloned());
        if let Some(index) = field.iter().position(|&k| k <= 0.0) {
            return Err(Collapsed(index));
        }
        Ok(&self.load / field)
    }

    fn adjoint(&self, field: &Vector, _state: &Vector, grad_state: &Vector) -> Result<Vector, Collapsed> {
        Ok(grad_state * &(-&self.load / &(field * field)))
    }
}

fn chain(stage: impl weft_core::Parameterization + Send + Sync + 'static, size: usize) -> CompositeParameterization {
    let stages: Vec<SharedStage> = vec![Arc::new(stage)];
    CompositeParameterization::new(stages, size).unwrap()
}

/// Tracks the displacement of springs with stiffness [2, 4] under unit load.
fn tracking() -> CompositeForm {
    CompositeForm::single(AugmentedLagrangianForm::new(&[0, 1], array![0.5, 0.25]).unwrap())
}

#[test]
fn rejects_mismatched_field_size() {
    let solver = Springs::new(array![1.0, 1.0]);

    let err = OptimizationProblem::new(&solver, chain(Exp, 3), tracking(), &RunContext::default())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::FieldSize {
            expected: 2,
            found: 3
        }
    ));
}

#[test]
fn gradient_matches_finite_differences() {
    let solver = Springs::new(array![1.0, 3.0]);
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 2), tracking(), &RunContext::default())
            .unwrap()
            .with_regularization(CompositeForm::single(LaggedRegForm::new(Weight::ONE)));
    let x = array![0.3, -0.2];

    let gradient = problem.gradient(&x).unwrap();

    let h = 1e-6;
    for i in 0..x.len() {
        let mut forward = x.clone();
        forward[i] += h;
        let mut backward = x.clone();
        backward[i] -= h;
        let numeric = (problem.value(&forward).unwrap() - problem.value(&backward).unwrap()) / (2.0 * h);
        assert_relative_eq!(gradient[i], numeric, epsilon = 1e-7);
    }
}

#[test]
fn value_and_gradient_share_one_forward_solve() {
    let solver = Springs::new(array![1.0, 1.0]);
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 2), tracking(), &RunContext::default())
            .unwrap();
    let x = array![0.0, 0.0];

    problem.value(&x).unwrap();
    problem.gradient(&x).unwrap();
    problem.value(&x).unwrap();

    assert_eq!(solver.solves.get(), 1);
    assert_eq!(problem.state(), Some(&array![1.0, 1.0]));
}

#[test]
fn trials_warm_start_from_line_search_begin() {
    let solver = Springs::new(array![1.0, 1.0]);
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 2), tracking(), &RunContext::default())
            .unwrap();
    let x0 = array![0.0, 0.0];
    let x1 = array![1.0, 1.0];

    problem.value(&x0).unwrap();
    problem.gradient(&x0).unwrap();
    problem.line_search_begin(&x0, &x1);
    problem.value(&x1).unwrap();
    problem.value(&array![0.5, 0.5]).unwrap();

    let warm_starts = solver.warm_starts.borrow();
    assert_eq!(warm_starts[0], None);
    assert_eq!(warm_starts[1], Some(array![1.0, 1.0]));
    assert_eq!(warm_starts[2], Some(array![1.0, 1.0]));
    assert_eq!(problem.x_at_line_search_begin(), Some(&x0));
    assert_relative_eq!(problem.current_value().unwrap(), 0.5 * (0.25 + 0.5625));
    assert!(problem.current_gradient().is_some());
}

#[test]
fn forward_failure_is_a_rejection() {
    let solver = Springs::new(array![1.0]);
    let mut problem = OptimizationProblem::new(
        &solver,
        chain(Affine::new(1.0, 0.0).unwrap(), 1),
        tracking_single(),
        &RunContext::default(),
    )
    .unwrap();

    let err = problem.value(&array![-1.0]).unwrap_err();

    assert_eq!(
        err,
        ProblemError::rejected("spring 0 has non-positive stiffness")
    );
    assert!(problem.value(&array![2.0]).is_ok());
}

fn tracking_single() -> CompositeForm {
    CompositeForm::single(AugmentedLagrangianForm::new(&[0], array![0.5]).unwrap())
}

#[test]
fn minimizer_recovers_stiffness() {
    let solver = Springs::new(array![1.0, 1.0]);
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 2), tracking(), &RunContext::default())
            .unwrap();
    let config = nonlinear::Config::new(Method::Lbfgs, 200, 1e-12, 0.0).unwrap();

    let solution = nonlinear::minimize_unobserved(&mut problem, &array![0.0, 0.0], &config).unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 2.0f64.ln(), epsilon = 1e-6);
    assert_relative_eq!(solution.x[1], 4.0f64.ln(), epsilon = 1e-6);
    assert_eq!(problem.iter(), solution.iters);
}

#[test]
fn initial_guess_inverts_the_chain() {
    let solver = Springs::new(array![1.0, 1.0]);
    let problem =
        OptimizationProblem::new(&solver, chain(Exp, 2), tracking(), &RunContext::default())
            .unwrap();

    let x = problem.initial_guess(&array![2.0, 4.0]).unwrap();

    assert_relative_eq!(x[0], 2.0f64.ln());
    assert_relative_eq!(x[1], 4.0f64.ln());
}

#[test]
fn initial_guess_rejects_field_of_wrong_length() {
    let solver = Springs::new(array![1.0, 1.0]);
    let pin_second = Scatter::new(vec![1], array![1.0, 1.0]).unwrap();
    let problem = OptimizationProblem::new(
        &solver,
        chain(pin_second, 1),
        tracking(),
        &RunContext::default(),
    )
    .unwrap();

    let err = problem.initial_guess(&array![1.0]).unwrap_err();

    assert!(matches!(
        err,
        Error::Param(ParamError::DimensionMismatch {
            source: DimensionError {
                expected: 2,
                found: 1
            },
            ..
        })
    ));
    assert_eq!(problem.initial_guess(&array![1.0, 3.0]).unwrap(), array![3.0]);
}

#[test]
fn post_step_refreshes_lagged_objective() {
    let solver = Springs::new(array![1.0]);
    let objective = CompositeForm::single(LaggedRegForm::new(Weight::ONE));
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 1), objective, &RunContext::default())
            .unwrap();
    let x = array![1.0];

    // The lag starts at the first state, u = 1.
    assert_relative_eq!(problem.value(&array![0.0]).unwrap(), 0.0);
    assert!(problem.value(&x).unwrap() > 0.0);

    problem.post_step(1, &x);

    assert_eq!(problem.iter(), 1);
    assert_relative_eq!(problem.value(&x).unwrap(), 0.0);
}

#[test]
fn checkpoints_every_save_frequency_iterations() {
    let solver = Springs::new(array![1.0]);
    let mut problem =
        OptimizationProblem::new(&solver, chain(Exp, 1), tracking_single(), &RunContext::default())
            .unwrap()
            .with_checkpoint(JsonLines::new(Vec::new()), 2)
            .unwrap();
    let x = array![0.0];

    problem.value(&x).unwrap();
    for iter in 1..=4 {
        problem.post_step(iter, &x);
    }

    let output = String::from_utf8(problem.into_checkpoint().into_inner()).unwrap();
    let records: Vec<Record> = output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].iter, 2);
    assert_eq!(records[1].iter, 4);
    assert_eq!(records[1].x, vec![0.0]);
    assert_eq!(records[1].state, vec![1.0]);
    assert_relative_eq!(records[0].value.unwrap(), 0.125);
}

#[test]
fn zero_save_frequency_is_rejected() {
    let solver = Springs::new(array![1.0]);
    let result =
        OptimizationProblem::new(&solver, chain(Exp, 1), tracking_single(), &RunContext::default())
            .unwrap()
            .with_checkpoint(JsonLines::new(Vec::new()), 0);

    assert!(matches!(result, Err(Error::SaveFrequency)));
}
