use approx::assert_relative_eq;
use ndarray::array;
use weft_core::{Form, RunContext, Vector, Weight, linalg};
use weft_forms::{CompositeForm, ElasticForm, FrictionForm, LaggedRegForm, fd};
use weft_solvers::{
    nonlinear::{self, Method},
    staggered::{self, Status},
};

fn newton() -> nonlinear::Config {
    nonlinear::Config::new(Method::Newton, 200, 1e-12, 0.0).unwrap()
}

#[test]
fn lagged_regularization_from_the_origin() {
    let mut objective = CompositeForm::single(LaggedRegForm::new(Weight::new(2.0).unwrap()));
    objective.init_lagging(&Vector::zeros(3));
    let x = array![1.0, 2.0, 2.0];

    assert_relative_eq!(objective.value(&x), 9.0);
    assert_eq!(objective.gradient(&x), array![2.0, 4.0, 4.0]);
    assert_eq!(
        linalg::to_dense(&objective.hessian(&x)),
        linalg::to_dense(&linalg::scaled_identity(3, 2.0))
    );

    objective.update_lagging(&x);
    assert_eq!(objective.value(&x), 0.0);
    assert_eq!(objective.gradient(&x), Vector::zeros(3));
}

#[test]
fn composite_derivatives_match_finite_differences() {
    let elastic = ElasticForm::new(linalg::diagonal(&array![2.0, 5.0]), array![1.0, -1.0]).unwrap();
    let mut lagged = LaggedRegForm::new(Weight::new(0.5).unwrap());
    lagged.init_lagging(&array![0.3, 0.7]);
    let x = array![1.1, -0.4];

    assert!(fd::gradient_mismatch(&elastic, &x, 1e-6) < 1e-6);
    assert!(fd::hessian_mismatch(&lagged, &x, 1e-6) < 1e-6);

    let mut objective = CompositeForm::single(elastic).with(lagged.clone(), Weight::new(3.0).unwrap());
    objective.init_lagging(&array![0.3, 0.7]);
    let expected = array![2.0 * 1.1 - 1.0, 5.0 * -0.4 + 1.0]
        + 3.0 * lagged.first_derivative_unweighted(&x);
    let gradient = objective.gradient(&x);
    assert_relative_eq!(gradient[0], expected[0], epsilon = 1e-12);
    assert_relative_eq!(gradient[1], expected[1], epsilon = 1e-12);
}

/// A block on a unit spring pulled by a load of 2, with friction whose normal
/// force grows with the displacement.
///
/// The fixed point of `x − 2 + ½ (1 + x/10) = 0` is `x = 1.5 / 1.05`.
#[test]
fn staggered_friction_reaches_the_fixed_point() {
    let x0 = Vector::zeros(1);
    let elastic = ElasticForm::new(linalg::diagonal(&array![1.0]), array![2.0]).unwrap();
    let friction = FrictionForm::new(x0.clone(), 0.5, 1e-3, |x: &Vector| x.mapv(|u| 1.0 + 0.1 * u)).unwrap();
    let mut objective = CompositeForm::single(elastic).with(friction, Weight::ONE);

    let solution = staggered::solve(
        &mut objective,
        &x0,
        &staggered::Config::new(None, 1e-10),
        &newton(),
        &RunContext::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert!(solution.lagging_iters >= 3);
    assert_relative_eq!(solution.x[0], 1.5 / 1.05, epsilon = 1e-9);
}

#[test]
fn single_lagging_pass_stops_after_one_update() {
    let x0 = Vector::zeros(1);
    let elastic = ElasticForm::new(linalg::diagonal(&array![1.0]), array![2.0]).unwrap();
    let friction = FrictionForm::new(x0.clone(), 0.5, 1e-3, |x: &Vector| x.mapv(|u| 1.0 + 0.1 * u)).unwrap();
    let mut objective = CompositeForm::single(elastic).with(friction, Weight::ONE);

    let solution = staggered::solve(
        &mut objective,
        &x0,
        &staggered::Config::default(),
        &newton(),
        &RunContext::default(),
    )
    .unwrap();

    // Second solve with λ = 1.15 from x = 1.5.
    assert_eq!(solution.status, Status::MaxLaggingIters);
    assert_eq!(solution.lagging_iters, 1);
    assert_relative_eq!(solution.x[0], 2.0 - 0.5 * 1.15, epsilon = 1e-9);
}
