use std::{fmt, sync::Arc};

use weft_core::{DimensionError, ParamError, Parameterization, Vector};

/// A stage that may be shared between chains and optimization runs.
pub type SharedStage = Arc<dyn Parameterization + Send + Sync>;

/// An ordered chain of parameterizations.
///
/// Evaluation runs the stages front to back. Gradient propagation replays the
/// forward pass to cache every stage's input, then folds the gradient back to
/// front, so each stage sees the input it actually transformed. An empty chain
/// is the identity.
///
/// Dimensions are checked once in [`CompositeParameterization::new`]; the
/// chain only accepts inputs of its declared input size afterwards.
#[derive(Clone)]
pub struct CompositeParameterization {
    stages: Vec<SharedStage>,
    input_size: usize,
    output_size: usize,
}

impl CompositeParameterization {
    /// Builds a chain accepting inputs of length `input_size`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::DimensionMismatch`] naming the first stage whose
    /// [`Parameterization::size`] rejects the output of the stage before it.
    pub fn new(stages: Vec<SharedStage>, input_size: usize) -> Result<Self, ParamError> {
        let mut size = input_size;
        for (index, stage) in stages.iter().enumerate() {
            size = stage
                .size(size)
                .map_err(|source| ParamError::DimensionMismatch {
                    index,
                    stage: stage.name().to_owned(),
                    source,
                })?;
        }

        Ok(Self {
            stages,
            input_size,
            output_size: size,
        })
    }

    /// Returns the empty chain over vectors of length `size`.
    pub fn identity(size: usize) -> Self {
        Self {
            stages: Vec::new(),
            input_size: size,
            output_size: size,
        }
    }

    /// Returns the design dimension the chain accepts.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Returns the field dimension the chain produces.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` for the identity chain.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stages in evaluation order.
    pub fn stages(&self) -> &[SharedStage] {
        &self.stages
    }

    fn check_input(&self, x: &Vector) {
        assert_eq!(
            x.len(),
            self.input_size,
            "parameterization chain expects {} design variables",
            self.input_size
        );
    }
}

impl Parameterization for CompositeParameterization {
    fn name(&self) -> &str {
        "composite"
    }

    fn size(&self, x_size: usize) -> Result<usize, DimensionError> {
        if x_size == self.input_size {
            Ok(self.output_size)
        } else {
            Err(DimensionError {
                expected: self.input_size,
                found: x_size,
            })
        }
    }

    fn eval(&self, x: &Vector) -> Vector {
        self.check_input(x);
        self.stages
            .iter()
            .fold(x.clone(), |y, stage| stage.eval(&y))
    }

    fn apply_jacobian(&self, grad_y: &Vector, x: &Vector) -> Vector {
        self.check_input(x);

        let mut inputs = Vec::with_capacity(self.stages.len());
        let mut y = x.clone();
        for stage in &self.stages {
            let next = stage.eval(&y);
            inputs.push(y);
            y = next;
        }

        self.stages
            .iter()
            .zip(&inputs)
            .rev()
            .fold(grad_y.clone(), |grad, (stage, input)| {
                stage.apply_jacobian(&grad, input)
            })
    }

    fn inverse_eval(&self, y: &Vector) -> Result<Vector, ParamError> {
        if y.len() != self.output_size {
            let index = self.stages.len().saturating_sub(1);
            return Err(ParamError::DimensionMismatch {
                index,
                stage: self.stages.get(index).map_or("identity", |s| s.name()).to_owned(),
                source: DimensionError {
                    expected: self.output_size,
                    found: y.len(),
                },
            });
        }
        self.stages
            .iter()
            .rev()
            .try_fold(y.clone(), |x, stage| stage.inverse_eval(&x))
    }
}

impl fmt::Debug for CompositeParameterization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeParameterization")
            .field(
                "stages",
                &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("input_size", &self.input_size)
            .field("output_size", &self.output_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;
    use weft_forms::fd;

    use crate::{Affine, BoundedSigmoid, Exp, PerElement, Scatter};

    fn stage(p: impl Parameterization + Send + Sync + 'static) -> SharedStage {
        Arc::new(p)
    }

    /// Largest entry of `J(x)ᵀ g` minus the chain's reverse pass.
    fn adjoint_mismatch(chain: &CompositeParameterization, x: &Vector, grad_y: &Vector) -> f64 {
        let jac = fd::jacobian(|x| chain.eval(x), x, 1e-6);
        let expected = jac.t().dot(grad_y);
        fd::max_abs_diff(&expected, &chain.apply_jacobian(grad_y, x))
    }

    fn nonlinear_chain() -> CompositeParameterization {
        CompositeParameterization::new(
            vec![
                stage(PerElement::new(vec![0, 1, 1, 0], 2).unwrap()),
                stage(BoundedSigmoid::new(0.5, 2.0).unwrap()),
                stage(Exp),
                stage(Affine::new(3.0, -1.0).unwrap()),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = CompositeParameterization::new(Vec::new(), 3).unwrap();
        let x = array![1.0, -2.0, 0.5];
        let g = array![0.1, 0.2, 0.3];

        assert_eq!(chain.eval(&x), x);
        assert_eq!(chain.apply_jacobian(&g, &x), g);
        assert_eq!(chain.inverse_eval(&x).unwrap(), x);
        assert_eq!(chain.output_size(), 3);
    }

    #[test]
    fn evaluates_front_to_back() {
        let chain = CompositeParameterization::new(
            vec![
                stage(Affine::new(2.0, 0.0).unwrap()),
                stage(Affine::new(1.0, 1.0).unwrap()),
            ],
            1,
        )
        .unwrap();

        // (2x) + 1, not 2(x + 1).
        assert_relative_eq!(chain.eval(&array![3.0])[0], 7.0);
    }

    #[test]
    fn rejects_mismatched_stages_at_construction() {
        let err = CompositeParameterization::new(
            vec![
                stage(PerElement::new(vec![0, 1, 0], 2).unwrap()),
                stage(Scatter::new(vec![0, 1], Vector::zeros(4)).unwrap()),
            ],
            2,
        )
        .unwrap_err();

        assert_eq!(
            err,
            ParamError::DimensionMismatch {
                index: 1,
                stage: "scatter".to_owned(),
                source: DimensionError {
                    expected: 2,
                    found: 3
                },
            }
        );
    }

    #[test]
    fn rejects_wrong_input_size() {
        let err = CompositeParameterization::new(
            vec![stage(PerElement::new(vec![0, 1], 2).unwrap())],
            3,
        )
        .unwrap_err();

        assert!(matches!(err, ParamError::DimensionMismatch { index: 0, .. }));
    }

    #[test]
    fn inverse_fails_when_any_stage_lacks_it() {
        let chain = nonlinear_chain();
        // Every stage after `PerElement` can invert this value.
        let y = Vector::from_elem(4, 3.0 * 1.0f64.exp() - 1.0);
        let err = chain.inverse_eval(&y).unwrap_err();

        assert!(matches!(err, ParamError::Unsupported { .. }));
    }

    #[test]
    fn inverse_runs_back_to_front() {
        let chain = CompositeParameterization::new(
            vec![
                stage(BoundedSigmoid::new(-1.0, 1.0).unwrap()),
                stage(Exp),
                stage(Affine::new(2.0, 0.5).unwrap()),
            ],
            2,
        )
        .unwrap();
        let x = array![0.3, -1.2];

        let recovered = chain.inverse_eval(&chain.eval(&x)).unwrap();

        assert_relative_eq!(recovered[0], x[0], epsilon = 1e-10);
        assert_relative_eq!(recovered[1], x[1], epsilon = 1e-10);
    }

    #[test]
    fn inverse_rejects_field_of_wrong_length() {
        let chain = CompositeParameterization::new(
            vec![stage(Scatter::new(vec![1], array![0.0, 0.0]).unwrap())],
            1,
        )
        .unwrap();

        assert_eq!(
            chain.inverse_eval(&array![1.0]),
            Err(ParamError::DimensionMismatch {
                index: 0,
                stage: "scatter".to_owned(),
                source: DimensionError {
                    expected: 2,
                    found: 1
                },
            })
        );
        assert!(matches!(
            CompositeParameterization::identity(2).inverse_eval(&array![1.0, 2.0, 3.0]),
            Err(ParamError::DimensionMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn nested_chain_reports_its_size() {
        let inner = nonlinear_chain();
        let outer = CompositeParameterization::new(
            vec![stage(inner), stage(Affine::new(0.5, 0.0).unwrap())],
            2,
        )
        .unwrap();

        assert_eq!(outer.output_size(), 4);
        assert!(adjoint_mismatch(&outer, &array![0.2, -0.4], &array![1.0, 2.0, -1.0, 0.5]) < 1e-7);
    }

    #[test]
    fn debug_lists_stage_names() {
        let chain = CompositeParameterization::new(vec![stage(Exp)], 1).unwrap();
        assert_eq!(
            format!("{chain:?}"),
            r#"CompositeParameterization { stages: ["exp"], input_size: 1, output_size: 1 }"#
        );
    }

    proptest! {
        #[test]
        fn single_stage_matches_finite_differences(
            x in prop::collection::vec(-2.0..2.0f64, 3),
            g in prop::collection::vec(-1.0..1.0f64, 3),
        ) {
            let chain = CompositeParameterization::new(
                vec![stage(BoundedSigmoid::new(1.0, 4.0).unwrap())],
                3,
            )
            .unwrap();
            prop_assert!(adjoint_mismatch(&chain, &Vector::from(x), &Vector::from(g)) < 1e-7);
        }

        #[test]
        fn long_chain_matches_finite_differences(
            x in prop::collection::vec(-2.0..2.0f64, 2),
            g in prop::collection::vec(-1.0..1.0f64, 4),
        ) {
            let chain = nonlinear_chain();
            prop_assert!(adjoint_mismatch(&chain, &Vector::from(x), &Vector::from(g)) < 1e-6);
        }

        #[test]
        fn empty_chain_passes_gradients_through(
            x in prop::collection::vec(-5.0..5.0f64, 4),
            g in prop::collection::vec(-5.0..5.0f64, 4),
        ) {
            let chain = CompositeParameterization::identity(4);
            let g = Vector::from(g);
            prop_assert_eq!(chain.apply_jacobian(&g, &Vector::from(x)), g);
        }
    }
}
