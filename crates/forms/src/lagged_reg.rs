use weft_core::{Form, Hessian, Vector, Weight, linalg};

/// Tikhonov regularization between `x` and a lagged copy of `x`.
///
/// ```text
/// value(x) = weight / 2 · ‖x − x_lagged‖²
/// ```
///
/// Keeps a staggered sub-solve from drifting far from the state at which the
/// lagged quantities of other forms were captured. The regularization weight
/// is part of the unweighted math; the base weight of the owning
/// [`WeightedForm`](crate::WeightedForm) multiplies on top of it.
#[derive(Debug, Clone)]
pub struct LaggedRegForm {
    weight: Weight,
    x_lagged: Vector,
}

impl LaggedRegForm {
    /// Creates the form with the given regularization weight.
    ///
    /// The lagged reference is empty until `init_lagging` is called.
    pub fn new(weight: Weight) -> Self {
        Self {
            weight,
            x_lagged: Vector::zeros(0),
        }
    }

    /// Returns the regularization weight.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Returns the current lagged reference.
    pub fn lagged(&self) -> &Vector {
        &self.x_lagged
    }

    fn deviation(&self, x: &Vector) -> Vector {
        debug_assert_eq!(
            x.len(),
            self.x_lagged.len(),
            "lagged regularization evaluated without a matching lagged state"
        );
        x - &self.x_lagged
    }
}

impl Form for LaggedRegForm {
    fn name(&self) -> &str {
        "lagged regularization"
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        let d = self.deviation(x);
        0.5 * self.weight.get() * d.dot(&d)
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        self.deviation(x) * self.weight.get()
    }

    fn second_derivative_unweighted(&self, x: &Vector) -> Hessian {
        linalg::scaled_identity(x.len(), self.weight.get())
    }

    fn uses_lagging(&self) -> bool {
        true
    }

    fn init_lagging(&mut self, x: &Vector) {
        self.update_lagging(x);
    }

    fn update_lagging(&mut self, x: &Vector) {
        self.x_lagged = x.clone();
    }
}
