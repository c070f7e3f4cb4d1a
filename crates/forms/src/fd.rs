//! Central finite differences for checking analytic derivatives.
//!
//! The mismatch helpers report `max |analytic - numeric| / (1 + max |analytic|)`
//! so one tolerance works for terms of very different magnitude.

use ndarray::Array2;
use weft_core::{Form, Vector, linalg};

/// Approximates the gradient of `f` at `x` with step `h`.
pub fn gradient(f: impl Fn(&Vector) -> f64, x: &Vector, h: f64) -> Vector {
    let mut probe = x.clone();
    Vector::from_shape_fn(x.len(), |i| {
        let xi = probe[i];
        probe[i] = xi + h;
        let forward = f(&probe);
        probe[i] = xi - h;
        let backward = f(&probe);
        probe[i] = xi;
        (forward - backward) / (2.0 * h)
    })
}

/// Approximates the Jacobian of `g` at `x`; row `i` holds `d g_i / d x`.
pub fn jacobian(g: impl Fn(&Vector) -> Vector, x: &Vector, h: f64) -> Array2<f64> {
    let mut probe = x.clone();
    let mut columns = Vec::with_capacity(x.len());
    for j in 0..x.len() {
        let xj = probe[j];
        probe[j] = xj + h;
        let forward = g(&probe);
        probe[j] = xj - h;
        let backward = g(&probe);
        probe[j] = xj;
        columns.push((forward - backward) / (2.0 * h));
    }

    let rows = columns.first().map_or(0, Vector::len);
    Array2::from_shape_fn((rows, x.len()), |(i, j)| columns[j][i])
}

/// Returns the largest absolute entry of `a - b`.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn max_abs_diff<D: ndarray::Dimension>(
    a: &ndarray::Array<f64, D>,
    b: &ndarray::Array<f64, D>,
) -> f64 {
    assert_eq!(a.shape(), b.shape(), "shape mismatch");
    a.iter()
        .zip(b.iter())
        .fold(0.0, |acc, (a, b)| f64::max(acc, (a - b).abs()))
}

/// Scaled mismatch between a form's gradient and finite differences of its value.
pub fn gradient_mismatch<F: Form + ?Sized>(form: &F, x: &Vector, h: f64) -> f64 {
    let analytic = form.first_derivative_unweighted(x);
    let numeric = gradient(|x| form.value_unweighted(x), x, h);
    scaled(max_abs_diff(&analytic, &numeric), &analytic)
}

/// Scaled mismatch between a form's Hessian and finite differences of its gradient.
pub fn hessian_mismatch<F: Form + ?Sized>(form: &F, x: &Vector, h: f64) -> f64 {
    let analytic = linalg::to_dense(&form.second_derivative_unweighted(x));
    let numeric = jacobian(|x| form.first_derivative_unweighted(x), x, h);
    scaled(max_abs_diff(&analytic, &numeric), &analytic)
}

fn scaled<D: ndarray::Dimension>(diff: f64, analytic: &ndarray::Array<f64, D>) -> f64 {
    let magnitude = analytic.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()));
    diff / (1.0 + magnitude)
}
