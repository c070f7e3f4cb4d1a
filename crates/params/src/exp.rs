use weft_core::{DimensionError, ParamError, Parameterization, Vector};

/// Elementwise `y = exp(x)`, keeping fields such as stiffness positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exp;

impl Parameterization for Exp {
    fn name(&self) -> &str {
        "exp"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        Ok(x_size)
    }

    fn eval(&self, x: &Vector) -> Vector {
        x.mapv(f64::exp)
    }

    fn apply_jacobian(&self, grad_y: &Vector, x: &Vector) -> Vector {
        grad_y * &x.mapv(f64::exp)
    }

    /// # Errors
    ///
    /// Returns [`ParamError::OutOfRange`] for a non-positive entry.
    fn inverse_eval(&self, y: &Vector) -> Result<Vector, ParamError> {
        if let Some((index, &value)) = y.iter().enumerate().find(|(_, v)| **v <= 0.0) {
            return Err(ParamError::OutOfRange {
                stage: self.name().to_owned(),
                index,
                value,
            });
        }
        Ok(y.mapv(f64::ln))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn jacobian_uses_the_input() {
        let x = array![0.0, 1.0];
        let grad = Exp.apply_jacobian(&array![1.0, 2.0], &x);

        assert_relative_eq!(grad[0], 1.0);
        assert_relative_eq!(grad[1], 2.0 * 1.0f64.exp());
    }

    #[test]
    fn inverse_requires_positive_values() {
        assert_relative_eq!(Exp.inverse_eval(&array![1.0]).unwrap()[0], 0.0);
        assert_eq!(
            Exp.inverse_eval(&array![1.0, -0.5]),
            Err(ParamError::OutOfRange {
                stage: "exp".to_owned(),
                index: 1,
                value: -0.5,
            })
        );
    }
}
