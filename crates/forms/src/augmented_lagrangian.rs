use weft_core::{Form, Hessian, Vector, linalg};

use crate::FormError;

/// Quadratic penalty pulling selected coordinates toward target values.
///
/// ```text
/// value(x) = ½ Σ_{i ∈ S} (x_i − t_i)²
/// ```
///
/// Used to impose Dirichlet-like conditions softly; an
/// [`AlWeightPolicy`](crate::AlWeightPolicy) grows the owning form's weight
/// between outer iterations until the constraint is met.
#[derive(Debug, Clone)]
pub struct AugmentedLagrangianForm {
    mask: Vector,
    target: Vector,
}

impl AugmentedLagrangianForm {
    /// Creates the penalty over `indices` of a vector of `target.len()`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::IndexOutOfRange`] if an index exceeds the target
    /// size.
    pub fn new(indices: &[usize], target: Vector) -> Result<Self, FormError> {
        let size = target.len();
        let mut mask = Vector::zeros(size);
        for &index in indices {
            if index >= size {
                return Err(FormError::IndexOutOfRange {
                    form: "augmented lagrangian",
                    index,
                    size,
                });
            }
            mask[index] = 1.0;
        }
        Ok(Self { mask, target })
    }

    /// Replaces the target values, e.g. for a new time step.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::DimensionMismatch`] if the size changes.
    pub fn set_target(&mut self, target: Vector) -> Result<(), FormError> {
        if target.len() != self.target.len() {
            return Err(FormError::DimensionMismatch {
                form: "augmented lagrangian",
                expected: self.target.len(),
                found: target.len(),
            });
        }
        self.target = target;
        Ok(())
    }

    /// Returns the norm of the constraint violation on the selected coordinates.
    pub fn constraint_error(&self, x: &Vector) -> f64 {
        linalg::norm(&self.residual(x))
    }

    fn residual(&self, x: &Vector) -> Vector {
        (x - &self.target) * &self.mask
    }
}

impl Form for AugmentedLagrangianForm {
    fn name(&self) -> &str {
        "augmented lagrangian"
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        let r = self.residual(x);
        0.5 * r.dot(&r)
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        self.residual(x)
    }

    fn second_derivative_unweighted(&self, _x: &Vector) -> Hessian {
        linalg::diagonal(&self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    use crate::fd;

    #[test]
    fn penalizes_only_selected_coordinates() {
        let form = AugmentedLagrangianForm::new(&[0, 2], array![1.0, 5.0, -1.0]).unwrap();
        let x = array![2.0, 100.0, 1.0];

        assert_relative_eq!(form.value_unweighted(&x), 0.5 * (1.0 + 4.0));
        assert_eq!(form.first_derivative_unweighted(&x), array![1.0, 0.0, 2.0]);
        assert_relative_eq!(form.constraint_error(&x), 5.0_f64.sqrt());

        let hessian = form.second_derivative_unweighted(&x);
        assert_eq!(hessian.nnz(), 3);
        assert_eq!(hessian.get(1, 1), Some(&0.0));
    }

    #[test]
    fn rejects_out_of_range_index() {
        let err = AugmentedLagrangianForm::new(&[3], array![0.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            FormError::IndexOutOfRange {
                form: "augmented lagrangian",
                index: 3,
                size: 2
            }
        );
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let mut form = AugmentedLagrangianForm::new(&[1], array![0.0, 0.0]).unwrap();
        form.set_target(array![0.5, -0.5]).unwrap();
        let x = array![0.3, 0.9];

        assert!(fd::gradient_mismatch(&form, &x, 1e-6) < 1e-8);
        assert!(fd::hessian_mismatch(&form, &x, 1e-6) < 1e-8);
        assert!(form.set_target(array![0.0]).is_err());
    }
}
