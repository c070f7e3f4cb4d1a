//! Shared fixtures for the workspace integration tests.

use sprs::{FillInReduction, SymmetryCheck, TriMat};
use sprs_ldl::Ldl;
use thiserror::Error;
use weft_core::{ForwardSolve, Hessian, Vector};

/// A chain of springs hanging from a wall.
///
/// Element `e` joins node `e − 1` to node `e`; element 0 joins node 0 to the
/// wall. The field holds one stiffness per element and the state holds one
/// displacement per node, solving `K(k) u = f` with a sparse LDLᵀ
/// factorization.
#[derive(Debug, Clone)]
pub struct SpringChain {
    load: Vector,
}

/// Errors raised by the [`SpringChain`] solve.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("element {element} has non-positive stiffness {stiffness}")]
    NonPositiveStiffness { element: usize, stiffness: f64 },

    #[error("stiffness factorization failed: {0}")]
    Factorization(String),
}

impl SpringChain {
    /// Creates a chain with one node per entry of `load`.
    pub fn new(load: Vector) -> Self {
        Self { load }
    }

    /// Returns the nodal loads.
    pub fn load(&self) -> &Vector {
        &self.load
    }

    /// Assembles the stiffness matrix for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NonPositiveStiffness`] for a collapsed element.
    pub fn stiffness(&self, field: &Vector) -> Result<Hessian, ChainError> {
        let n = self.load.len();
        let mut triplets = TriMat::new((n, n));
        for (element, &k) in field.iter().enumerate() {
            if k.is_nan() || k <= 0.0 {
                return Err(ChainError::NonPositiveStiffness {
                    element,
                    stiffness: k,
                });
            }
            triplets.add_triplet(element, element, k);
            if element > 0 {
                triplets.add_triplet(element - 1, element - 1, k);
                triplets.add_triplet(element - 1, element, -k);
                triplets.add_triplet(element, element - 1, -k);
            }
        }
        Ok(triplets.to_csr())
    }

    fn factor_solve(&self, field: &Vector, rhs: &Vector) -> Result<Vector, ChainError> {
        let stiffness = self.stiffness(field)?;
        let ldl = Ldl::new()
            .fill_in_reduction(FillInReduction::ReverseCuthillMcKee)
            .check_symmetry(SymmetryCheck::DontCheckSymmetry)
            .numeric(stiffness.view())
            .map_err(|err| ChainError::Factorization(err.to_string()))?;
        Ok(Vector::from(ldl.solve(rhs.to_vec())))
    }
}

/// Elongation of element `e` in `u`, with the wall fixed at zero.
fn elongation(u: &Vector, element: usize) -> f64 {
    if element == 0 {
        u[0]
    } else {
        u[element] - u[element - 1]
    }
}

impl ForwardSolve for SpringChain {
    type Error = ChainError;

    fn field_size(&self) -> usize {
        self.load.len()
    }

    fn solve(&self, field: &Vector, _warm_start: Option<&Vector>) -> Result<Vector, ChainError> {
        self.factor_solve(field, &self.load)
    }

    /// `dJ/dk_e = −λᵀ (∂K/∂k_e) u` with `K λ = ∂J/∂u`.
    fn adjoint(
        &self,
        field: &Vector,
        state: &Vector,
        grad_state: &Vector,
    ) -> Result<Vector, ChainError> {
        let lambda = self.factor_solve(field, grad_state)?;
        Ok(Vector::from_shape_fn(field.len(), |e| {
            -elongation(&lambda, e) * elongation(state, e)
        }))
    }
}

/// Displacements of a chain with stiffnesses `field` under a unit tip load.
pub fn tip_displacements(field: &[f64]) -> Vector {
    let mut u = 0.0;
    field
        .iter()
        .map(|k| {
            u += 1.0 / k;
            u
        })
        .collect()
}

/// A unit load on the last of `n` nodes.
pub fn tip_load(n: usize) -> Vector {
    let mut load = Vector::zeros(n);
    load[n - 1] = 1.0;
    load
}
