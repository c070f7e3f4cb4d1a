use weft_core::{Form, Hessian, Vector, linalg};

use crate::FormError;

/// Linear elastic potential with a fixed stiffness and external load.
///
/// ```text
/// value(x) = ½ xᵀ K x − fᵀ x
/// ```
///
/// `K` is assembled elsewhere and must be symmetric.
#[derive(Debug, Clone)]
pub struct ElasticForm {
    stiffness: Hessian,
    load: Vector,
}

impl ElasticForm {
    /// Creates the form from a square stiffness matrix and a matching load.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::DimensionMismatch`] if `stiffness` is not square
    /// or `load` does not match its size.
    pub fn new(stiffness: Hessian, load: Vector) -> Result<Self, FormError> {
        let (rows, cols) = stiffness.shape();
        if rows != cols {
            return Err(FormError::DimensionMismatch {
                form: "elastic",
                expected: rows,
                found: cols,
            });
        }
        if load.len() != rows {
            return Err(FormError::DimensionMismatch {
                form: "elastic",
                expected: rows,
                found: load.len(),
            });
        }
        Ok(Self {
            stiffness: stiffness.to_csr(),
            load,
        })
    }

    /// Returns the stiffness matrix.
    pub fn stiffness(&self) -> &Hessian {
        &self.stiffness
    }

    /// Returns the external load.
    pub fn load(&self) -> &Vector {
        &self.load
    }
}

impl Form for ElasticForm {
    fn name(&self) -> &str {
        "elastic"
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        0.5 * x.dot(&linalg::mul_vec(&self.stiffness, x)) - self.load.dot(x)
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        linalg::mul_vec(&self.stiffness, x) - &self.load
    }

    fn second_derivative_unweighted(&self, _x: &Vector) -> Hessian {
        self.stiffness.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;
    use sprs::TriMat;

    use crate::fd;

    /// Stiffness of three unit springs in a chain, first node fixed.
    fn chain_stiffness() -> Hessian {
        let mut tri = TriMat::new((3, 3));
        for (r, c, v) in [
            (0, 0, 2.0),
            (0, 1, -1.0),
            (1, 0, -1.0),
            (1, 1, 2.0),
            (1, 2, -1.0),
            (2, 1, -1.0),
            (2, 2, 1.0),
        ] {
            tri.add_triplet(r, c, v);
        }
        tri.to_csr()
    }

    #[test]
    fn rejects_mismatched_load() {
        let err = ElasticForm::new(chain_stiffness(), array![1.0]).unwrap_err();
        assert_eq!(
            err,
            FormError::DimensionMismatch {
                form: "elastic",
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn gradient_vanishes_at_equilibrium() {
        let form = ElasticForm::new(chain_stiffness(), array![0.0, 0.0, 1.0]).unwrap();
        // K u = f has solution u = [1, 2, 3] for a unit tip load.
        let u = array![1.0, 2.0, 3.0];

        let gradient = form.first_derivative_unweighted(&u);

        for g in gradient {
            assert_relative_eq!(g, 0.0, epsilon = 1e-12);
        }
        assert_relative_eq!(form.value_unweighted(&u), -1.5);
    }

    proptest! {
        #[test]
        fn derivatives_match_finite_differences(
            x in prop::collection::vec(-3.0..3.0f64, 3),
            f in prop::collection::vec(-3.0..3.0f64, 3),
        ) {
            let form = ElasticForm::new(chain_stiffness(), Vector::from(f)).unwrap();
            let x = Vector::from(x);

            prop_assert!(fd::gradient_mismatch(&form, &x, 1e-6) < 1e-5);
            prop_assert!(fd::hessian_mismatch(&form, &x, 1e-6) < 1e-5);
        }
    }
}
