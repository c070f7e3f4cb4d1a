//! Vector and sparse matrix aliases shared by every crate in the workspace.
//!
//! Hessians are stored in CSR form. Helpers here always store every slot they
//! create, zeros included, so a matrix's sparsity pattern depends only on its
//! shape and never on the values at a particular point.

use ndarray::{Array1, Array2};
use sprs::{CsMat, TriMat};

/// A dense vector of `f64`.
pub type Vector = Array1<f64>;

/// A sparse, square, symmetric second-derivative matrix.
pub type Hessian = CsMat<f64>;

/// Builds a diagonal matrix with `values` on the diagonal.
///
/// Zero values are stored explicitly.
#[must_use]
pub fn diagonal(values: &Vector) -> Hessian {
    let n = values.len();
    let indptr: Vec<usize> = (0..=n).collect();
    let indices: Vec<usize> = (0..n).collect();
    CsMat::new((n, n), indptr, indices, values.to_vec())
}

/// Builds `scale * I` of size `n`.
#[must_use]
pub fn scaled_identity(n: usize, scale: f64) -> Hessian {
    diagonal(&Vector::from_elem(n, scale))
}

/// Computes `h * v`.
///
/// # Panics
///
/// Panics if `v.len()` does not match the number of columns of `h`.
#[must_use]
pub fn mul_vec(h: &Hessian, v: &Vector) -> Vector {
    assert_eq!(h.cols(), v.len(), "matrix/vector dimension mismatch");
    let mut out = Vector::zeros(h.rows());
    for (&value, (row, col)) in h.iter() {
        out[row] += value * v[col];
    }
    out
}

/// Expands `h` into a dense matrix, summing any duplicate entries.
#[must_use]
pub fn to_dense(h: &Hessian) -> Array2<f64> {
    let mut out = Array2::zeros(h.shape());
    for (&value, (row, col)) in h.iter() {
        out[[row, col]] += value;
    }
    out
}

/// Returns the Euclidean norm of `v`.
#[must_use]
pub fn norm(v: &Vector) -> f64 {
    v.dot(v).sqrt()
}

/// Accumulates scaled matrices into a single CSR matrix.
///
/// Entries are summed through a triplet list, so stored zeros of every
/// contribution remain part of the final pattern.
#[derive(Debug)]
pub struct HessianBuilder {
    triplets: TriMat<f64>,
}

impl HessianBuilder {
    /// Creates an empty `n x n` builder.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            triplets: TriMat::new((n, n)),
        }
    }

    /// Adds `scale * h`.
    ///
    /// # Panics
    ///
    /// Panics if `h` does not have the builder's shape.
    pub fn add(&mut self, h: &Hessian, scale: f64) {
        assert_eq!(
            h.shape(),
            self.triplets.shape(),
            "hessian shape mismatch during assembly"
        );
        for (&value, (row, col)) in h.iter() {
            self.triplets.add_triplet(row, col, scale * value);
        }
    }

    /// Finishes assembly, summing duplicate entries.
    #[must_use]
    pub fn build(self) -> Hessian {
        self.triplets.to_csr()
    }
}
