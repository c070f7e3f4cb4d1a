use weft_core::{DimensionError, ParamError, Parameterization, Vector};

use crate::BuildError;

/// Elementwise logistic map of ℝ onto the open interval `(lower, upper)`.
///
/// Used to keep bounded design fields (densities, radii) inside their
/// admissible range without constraints on the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedSigmoid {
    lower: f64,
    upper: f64,
}

impl BoundedSigmoid {
    /// Creates a sigmoid onto `(lower, upper)`.
    ///
    /// # Errors
    ///
    /// Returns an error unless both bounds are finite and `lower < upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, BuildError> {
        if lower.is_finite() && upper.is_finite() && lower < upper {
            Ok(Self { lower, upper })
        } else {
            Err(BuildError::InvalidBounds { lower, upper })
        }
    }

    fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Parameterization for BoundedSigmoid {
    fn name(&self) -> &str {
        "bounded sigmoid"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        Ok(x_size)
    }

    fn eval(&self, x: &Vector) -> Vector {
        x.mapv(|v| self.lower + self.width() * logistic(v))
    }

    fn apply_jacobian(&self, grad_y: &Vector, x: &Vector) -> Vector {
        let slope = x.mapv(|v| {
            let s = logistic(v);
            self.width() * s * (1.0 - s)
        });
        grad_y * &slope
    }

    /// # Errors
    ///
    /// Returns [`ParamError::OutOfRange`] for an entry outside `(lower, upper)`.
    fn inverse_eval(&self, y: &Vector) -> Result<Vector, ParamError> {
        let mut x = Vector::zeros(y.len());
        for (index, (&value, xi)) in y.iter().zip(x.iter_mut()).enumerate() {
            let t = (value - self.lower) / self.width();
            if !(t > 0.0 && t < 1.0) {
                return Err(ParamError::OutOfRange {
                    stage: self.name().to_owned(),
                    index,
                    value,
                });
            }
            *xi = (t / (1.0 - t)).ln();
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn zero_maps_to_midpoint() {
        let map = BoundedSigmoid::new(1.0, 3.0).unwrap();
        let x = array![0.0];

        assert_relative_eq!(map.eval(&x)[0], 2.0);
        assert_relative_eq!(map.apply_jacobian(&array![1.0], &x)[0], 0.5);
        assert_relative_eq!(map.inverse_eval(&array![2.0]).unwrap()[0], 0.0);
    }

    #[test]
    fn stays_inside_bounds() {
        let map = BoundedSigmoid::new(-1.0, 1.0).unwrap();
        let y = map.eval(&array![-30.0, 30.0]);

        assert!(y[0] >= -1.0 && y[1] <= 1.0);
        assert!(map.inverse_eval(&array![1.0]).is_err());
    }

    #[test]
    fn rejects_empty_interval() {
        assert_eq!(
            BoundedSigmoid::new(2.0, 2.0),
            Err(BuildError::InvalidBounds {
                lower: 2.0,
                upper: 2.0
            })
        );
    }
}
