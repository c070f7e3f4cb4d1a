use weft_core::{DimensionError, ParamError, Parameterization, Vector};

use crate::BuildError;

/// Writes design values into selected entries of a fixed full vector.
///
/// Entries not selected keep their value from `base`. The inverse gathers
/// the selected entries back out.
#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    indices: Vec<usize>,
    base: Vector,
}

impl Scatter {
    /// Creates a scatter into a copy of `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if an index is out of range or repeated.
    pub fn new(indices: Vec<usize>, base: Vector) -> Result<Self, BuildError> {
        let mut seen = vec![false; base.len()];
        for &index in &indices {
            match seen.get_mut(index) {
                None => {
                    return Err(BuildError::IndexOutOfRange {
                        stage: "scatter",
                        index,
                        size: base.len(),
                    });
                }
                Some(true) => return Err(BuildError::DuplicateIndex { stage: "scatter", index }),
                Some(slot) => *slot = true,
            }
        }
        Ok(Self { indices, base })
    }
}

impl Parameterization for Scatter {
    fn name(&self) -> &str {
        "scatter"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        if x_size == self.indices.len() {
            Ok(self.base.len())
        } else {
            Err(DimensionError {
                expected: self.indices.len(),
                found: x_size,
            })
        }
    }

    fn eval(&self, x: &Vector) -> Vector {
        let mut y = self.base.clone();
        for (&index, &value) in self.indices.iter().zip(x) {
            y[index] = value;
        }
        y
    }

    fn apply_jacobian(&self, grad_y: &Vector, _x: &Vector) -> Vector {
        self.indices.iter().map(|&index| grad_y[index]).collect()
    }

    fn inverse_eval(&self, y: &Vector) -> Result<Vector, ParamError> {
        if y.len() != self.base.len() {
            return Err(ParamError::DimensionMismatch {
                index: 0,
                stage: self.name().to_owned(),
                source: DimensionError {
                    expected: self.base.len(),
                    found: y.len(),
                },
            });
        }
        Ok(self.indices.iter().map(|&index| y[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    #[test]
    fn writes_selected_entries() {
        let map = Scatter::new(vec![2, 0], array![1.0, 1.0, 1.0, 1.0]).unwrap();
        let x = array![5.0, 7.0];

        assert_eq!(map.eval(&x), array![7.0, 1.0, 5.0, 1.0]);
        assert_eq!(map.apply_jacobian(&array![1.0, 2.0, 3.0, 4.0], &x), array![3.0, 1.0]);
        assert_eq!(map.inverse_eval(&map.eval(&x)).unwrap(), x);
    }

    #[test]
    fn inverse_needs_a_full_vector() {
        let map = Scatter::new(vec![1, 2], Vector::zeros(3)).unwrap();

        assert!(matches!(
            map.inverse_eval(&array![4.0, 5.0]),
            Err(ParamError::DimensionMismatch {
                source: DimensionError {
                    expected: 3,
                    found: 2
                },
                ..
            })
        ));
    }

    #[test]
    fn rejects_repeated_index() {
        assert_eq!(
            Scatter::new(vec![1, 1], Vector::zeros(3)),
            Err(BuildError::DuplicateIndex {
                stage: "scatter",
                index: 1
            })
        );
        assert!(Scatter::new(vec![3], Vector::zeros(3)).is_err());
    }
}
