use weft_core::{DimensionError, ParamError, Parameterization, Vector};

use crate::BuildError;

/// Elementwise `y = scale * x + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    scale: f64,
    offset: f64,
}

impl Affine {
    /// Creates an affine map.
    ///
    /// # Errors
    ///
    /// Returns an error if `scale` is zero or either argument is not finite.
    pub fn new(scale: f64, offset: f64) -> Result<Self, BuildError> {
        if !scale.is_finite() || scale == 0.0 {
            return Err(BuildError::InvalidParameter {
                stage: "affine",
                parameter: "scale",
                value: scale,
            });
        }
        if !offset.is_finite() {
            return Err(BuildError::InvalidParameter {
                stage: "affine",
                parameter: "offset",
                value: offset,
            });
        }
        Ok(Self { scale, offset })
    }
}

impl Parameterization for Affine {
    fn name(&self) -> &str {
        "affine"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        Ok(x_size)
    }

    fn eval(&self, x: &Vector) -> Vector {
        x.mapv(|v| self.scale * v + self.offset)
    }

    fn apply_jacobian(&self, grad_y: &Vector, _x: &Vector) -> Vector {
        grad_y * self.scale
    }

    fn inverse_eval(&self, y: &Vector) -> Result<Vector, ParamError> {
        Ok(y.mapv(|v| (v - self.offset) / self.scale))
    }
}
