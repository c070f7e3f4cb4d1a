use crate::{Hessian, Vector};

/// A single scalar energy or penalty term over a state vector.
///
/// Implementors provide the *unweighted* value and its exact first and second
/// derivatives. Weighting is applied uniformly by the wrapper that owns the
/// form (see `weft_forms::WeightedForm`), so implementations never see the
/// weight and every form is interchangeable under composition.
///
/// # Lagging
///
/// Some forms depend on state that is frozen during an inner solve (contact
/// normals, friction forces, a regularization reference). Such forms return
/// `true` from [`Form::uses_lagging`] and capture that state in
/// [`Form::init_lagging`] and [`Form::update_lagging`]. Between two lagging
/// calls, evaluations must treat the lagged state as constant and must not
/// mutate it.
///
/// # Sparsity
///
/// [`Form::second_derivative_unweighted`] must return the same sparsity
/// pattern for every `x` of a given dimension. Coordinates a form does not
/// touch at a particular `x` are stored as explicit zeros.
pub trait Form {
    /// Short, human-readable name used in log output.
    fn name(&self) -> &str;

    /// Computes the unweighted value at `x`.
    fn value_unweighted(&self, x: &Vector) -> f64;

    /// Computes the gradient of [`Form::value_unweighted`] at `x`.
    fn first_derivative_unweighted(&self, x: &Vector) -> Vector;

    /// Computes the Hessian of [`Form::value_unweighted`] at `x`.
    fn second_derivative_unweighted(&self, x: &Vector) -> Hessian;

    /// Returns `true` if this form keeps lagged state.
    fn uses_lagging(&self) -> bool {
        false
    }

    /// Captures the lagged reference state at the start of an outer loop.
    fn init_lagging(&mut self, _x: &Vector) {}

    /// Refreshes the lagged reference state to the latest accepted `x`.
    fn update_lagging(&mut self, _x: &Vector) {}

    /// Returns `false` if moving from `x0` to `x1` would leave the form's
    /// admissible region (for example an inverted element or a crossed
    /// contact gap).
    fn is_step_valid(&self, _x0: &Vector, _x1: &Vector) -> bool {
        true
    }

    /// Returns the largest fraction of the step `x0 -> x1`, in `[0, 1]`, that
    /// keeps the form admissible.
    fn max_step_size(&self, _x0: &Vector, _x1: &Vector) -> f64 {
        1.0
    }
}

impl<F: Form + ?Sized> Form for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        (**self).value_unweighted(x)
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        (**self).first_derivative_unweighted(x)
    }

    fn second_derivative_unweighted(&self, x: &Vector) -> Hessian {
        (**self).second_derivative_unweighted(x)
    }

    fn uses_lagging(&self) -> bool {
        (**self).uses_lagging()
    }

    fn init_lagging(&mut self, x: &Vector) {
        (**self).init_lagging(x);
    }

    fn update_lagging(&mut self, x: &Vector) {
        (**self).update_lagging(x);
    }

    fn is_step_valid(&self, x0: &Vector, x1: &Vector) -> bool {
        (**self).is_step_valid(x0, x1)
    }

    fn max_step_size(&self, x0: &Vector, x1: &Vector) -> f64 {
        (**self).max_step_size(x0, x1)
    }
}

/// Phase of the lagging state machine.
///
/// A lagging form starts `Uninitialized`; `init_lagging` moves it to `Ready`
/// and every later `update_lagging` keeps it there with a new reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LagPhase {
    #[default]
    Uninitialized,
    Ready,
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::linalg;

    /// f(x) = sum(x).
    struct Sum;

    impl Form for Sum {
        fn name(&self) -> &str {
            "sum"
        }

        fn value_unweighted(&self, x: &Vector) -> f64 {
            x.sum()
        }

        fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
            Vector::ones(x.len())
        }

        fn second_derivative_unweighted(&self, x: &Vector) -> Hessian {
            linalg::scaled_identity(x.len(), 0.0)
        }
    }

    #[test]
    fn boxed_form_delegates() {
        let mut form: Box<dyn Form> = Box::new(Sum);
        let x = array![1.0, 2.0];

        form.init_lagging(&x);

        assert_eq!(form.name(), "sum");
        assert!(!form.uses_lagging());
        assert_relative_eq!(form.value_unweighted(&x), 3.0);
        assert_eq!(form.first_derivative_unweighted(&x), array![1.0, 1.0]);
        assert_eq!(form.second_derivative_unweighted(&x).nnz(), 2);
        assert!(form.is_step_valid(&x, &x));
        assert_relative_eq!(form.max_step_size(&x, &x), 1.0);
    }
}
