use std::fmt;

use weft_core::{Form, Hessian, Vector, linalg};

use crate::{FormError, error::positive};

/// Normal-force model evaluated whenever the lagged state is refreshed.
pub type NormalForce = Box<dyn Fn(&Vector) -> Vector>;

/// Smoothed Coulomb friction with lagged normal forces.
///
/// Tangential displacement is measured from the start-of-step positions
/// `x_prev`. With lagged normal force magnitudes `λ`, friction coefficient
/// `μ`, and static-to-dynamic transition width `ε_v`:
///
/// ```text
/// value(x) = μ Σ λ_i f₀(|x_i − x_prev_i|)
/// f₀(s) = −s³/(3ε_v²) + s²/ε_v + ε_v/3   for s < ε_v
///       = s                              for s ≥ ε_v
/// ```
///
/// `λ` is recomputed from the normal-force model only in `init_lagging` and
/// `update_lagging`; in between it is constant, which turns the two-way
/// contact/friction coupling into a smooth potential an inner Newton solve
/// can handle.
pub struct FrictionForm {
    x_prev: Vector,
    mu: f64,
    epsv: f64,
    normal_force: NormalForce,
    lagged_force: Vector,
}

impl FrictionForm {
    /// Creates a friction form.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidParameter`] if `mu` is negative or not
    /// finite, or `epsv` is not positive.
    pub fn new(
        x_prev: Vector,
        mu: f64,
        epsv: f64,
        normal_force: impl Fn(&Vector) -> Vector + 'static,
    ) -> Result<Self, FormError> {
        if !mu.is_finite() || mu < 0.0 {
            return Err(FormError::InvalidParameter {
                form: "friction",
                parameter: "mu",
                value: mu,
            });
        }
        let epsv = positive("friction", "epsv", epsv)?;
        Ok(Self {
            lagged_force: Vector::zeros(x_prev.len()),
            x_prev,
            mu,
            epsv,
            normal_force: Box::new(normal_force),
        })
    }

    /// Moves the start-of-step positions, e.g. when a time step advances.
    pub fn set_previous(&mut self, x_prev: Vector) {
        self.x_prev = x_prev;
    }

    /// Returns the lagged normal force magnitudes.
    pub fn lagged_force(&self) -> &Vector {
        &self.lagged_force
    }

    /// Scale `μ λ_i` of each coordinate's dissipative potential.
    fn scale(&self, i: usize) -> f64 {
        self.mu * self.lagged_force[i]
    }
}

impl Form for FrictionForm {
    fn name(&self) -> &str {
        "friction"
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        (x - &self.x_prev)
            .iter()
            .enumerate()
            .map(|(i, &u)| self.scale(i) * f0(u.abs(), self.epsv))
            .sum()
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        let mut gradient = x - &self.x_prev;
        for (i, u) in gradient.iter_mut().enumerate() {
            *u *= self.scale(i) * f1_over_s(u.abs(), self.epsv);
        }
        gradient
    }

    fn second_derivative_unweighted(&self, x: &Vector) -> Hessian {
        let mut diagonal = x - &self.x_prev;
        for (i, u) in diagonal.iter_mut().enumerate() {
            *u = self.scale(i) * f2(u.abs(), self.epsv);
        }
        linalg::diagonal(&diagonal)
    }

    fn uses_lagging(&self) -> bool {
        true
    }

    fn init_lagging(&mut self, x: &Vector) {
        self.update_lagging(x);
    }

    fn update_lagging(&mut self, x: &Vector) {
        let force = (self.normal_force)(x);
        debug_assert_eq!(force.len(), x.len(), "normal force has the wrong size");
        self.lagged_force = force.mapv(f64::abs);
    }
}

impl fmt::Debug for FrictionForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrictionForm")
            .field("mu", &self.mu)
            .field("epsv", &self.epsv)
            .field("lagged_force", &self.lagged_force)
            .finish_non_exhaustive()
    }
}

/// Mollified sliding distance.
fn f0(s: f64, epsv: f64) -> f64 {
    if s >= epsv {
        s
    } else {
        -s.powi(3) / (3.0 * epsv * epsv) + s * s / epsv + epsv / 3.0
    }
}

/// `f₀'(s) / s`, finite at `s = 0`.
fn f1_over_s(s: f64, epsv: f64) -> f64 {
    if s >= epsv {
        1.0 / s
    } else {
        -s / (epsv * epsv) + 2.0 / epsv
    }
}

/// Second derivative of `f₀(|u|)` with respect to `u`.
fn f2(s: f64, epsv: f64) -> f64 {
    if s >= epsv {
        0.0
    } else {
        -2.0 * s / (epsv * epsv) + 2.0 / epsv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    use crate::fd;

    fn constant_force(value: f64) -> impl Fn(&Vector) -> Vector {
        move |x: &Vector| Vector::from_elem(x.len(), value)
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(FrictionForm::new(array![0.0], -0.1, 1e-3, constant_force(1.0)).is_err());
        assert!(FrictionForm::new(array![0.0], 0.5, 0.0, constant_force(1.0)).is_err());
    }

    #[test]
    fn sliding_friction_is_linear_in_distance() {
        let mut form = FrictionForm::new(array![0.0, 0.0], 0.5, 1e-3, constant_force(2.0)).unwrap();
        form.init_lagging(&array![0.0, 0.0]);
        let x = array![1.0, -3.0];

        assert_relative_eq!(form.value_unweighted(&x), 0.5 * 2.0 * 4.0);
        let gradient = form.first_derivative_unweighted(&x);
        assert_relative_eq!(gradient[0], 1.0);
        assert_relative_eq!(gradient[1], -1.0);
        assert_eq!(form.second_derivative_unweighted(&x).nnz(), 2);
    }

    #[test]
    fn normal_force_is_frozen_between_updates() {
        let mut form =
            FrictionForm::new(array![0.0], 1.0, 0.1, |x: &Vector| x.mapv(|v| 10.0 * v)).unwrap();
        form.init_lagging(&array![1.0]);
        let at_init = form.value_unweighted(&array![2.0]);

        // Evaluating elsewhere does not touch the lagged force.
        let _ = form.value_unweighted(&array![5.0]);
        assert_relative_eq!(form.value_unweighted(&array![2.0]), at_init);
        assert_eq!(form.lagged_force(), &array![10.0]);

        form.update_lagging(&array![2.0]);
        assert_eq!(form.lagged_force(), &array![20.0]);
    }

    #[test]
    fn static_regime_is_smooth_at_rest() {
        let mut form = FrictionForm::new(array![0.0], 1.0, 0.1, constant_force(1.0)).unwrap();
        form.init_lagging(&array![0.0]);
        let x = array![0.0];

        assert_relative_eq!(form.value_unweighted(&x), 0.1 / 3.0);
        assert_eq!(form.first_derivative_unweighted(&x), array![0.0]);
        assert_relative_eq!(
            *form.second_derivative_unweighted(&x).get(0, 0).unwrap(),
            2.0 / 0.1
        );
    }

    proptest! {
        #[test]
        fn derivatives_match_finite_differences(
            x in prop::collection::vec(-0.3..0.3f64, 3),
            lag in prop::collection::vec(-1.0..1.0f64, 3),
        ) {
            let x_prev = array![0.05, -0.02, 0.0];
            let mut form =
                FrictionForm::new(x_prev, 0.3, 0.05, |x: &Vector| x.mapv(|v| 1.0 + v * v)).unwrap();
            form.init_lagging(&Vector::from(lag));
            let x = Vector::from(x);

            prop_assert!(fd::gradient_mismatch(&form, &x, 1e-7) < 1e-5);
            prop_assert!(fd::hessian_mismatch(&form, &x, 1e-7) < 1e-3);
        }
    }
}
