use weft_core::{DimensionError, Parameterization, Vector};

use crate::BuildError;

/// Expands one value per body into one value per element.
///
/// Element `e` takes the value of body `ids[e]`. The map is many-to-one, so
/// it has no inverse; its adjoint sums element gradients into their bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerElement {
    ids: Vec<usize>,
    num_bodies: usize,
}

impl PerElement {
    /// Creates the expansion from an element-to-body id list.
    ///
    /// # Errors
    ///
    /// Returns an error if an id is not below `num_bodies`.
    pub fn new(ids: Vec<usize>, num_bodies: usize) -> Result<Self, BuildError> {
        if let Some(&index) = ids.iter().find(|&&id| id >= num_bodies) {
            return Err(BuildError::IndexOutOfRange {
                stage: "per element",
                index,
                size: num_bodies,
            });
        }
        Ok(Self { ids, num_bodies })
    }
}

impl Parameterization for PerElement {
    fn name(&self) -> &str {
        "per element"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        if x_size == self.num_bodies {
            Ok(self.ids.len())
        } else {
            Err(DimensionError {
                expected: self.num_bodies,
                found: x_size,
            })
        }
    }

    fn eval(&self, x: &Vector) -> Vector {
        self.ids.iter().map(|&id| x[id]).collect()
    }

    fn apply_jacobian(&self, grad_y: &Vector, x: &Vector) -> Vector {
        let mut grad = Vector::zeros(x.len());
        for (&id, &g) in self.ids.iter().zip(grad_y) {
            grad[id] += g;
        }
        grad
    }
}
