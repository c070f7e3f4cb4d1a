use weft_core::{Hessian, Problem, ProblemError, Vector};
use weft_forms::CompositeForm;

/// Presents a [`CompositeForm`] with frozen lagged state as a [`Problem`].
///
/// Non-finite energies (for example a barrier evaluated past contact) are
/// reported as rejections so the line search backs off.
#[derive(Debug)]
pub struct EnergyProblem<'a> {
    objective: &'a CompositeForm,
}

impl<'a> EnergyProblem<'a> {
    /// Wraps `objective`.
    pub fn new(objective: &'a CompositeForm) -> Self {
        Self { objective }
    }
}

impl Problem for EnergyProblem<'_> {
    fn value(&mut self, x: &Vector) -> Result<f64, ProblemError> {
        let value = self.objective.value(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ProblemError::rejected(format!("energy is {value}")))
        }
    }

    fn gradient(&mut self, x: &Vector) -> Result<Vector, ProblemError> {
        let grad = self.objective.gradient(x);
        if grad.iter().all(|g| g.is_finite()) {
            Ok(grad)
        } else {
            Err(ProblemError::rejected("gradient is not finite"))
        }
    }

    fn hessian(&mut self, x: &Vector) -> Result<Hessian, ProblemError> {
        Ok(self.objective.hessian(x))
    }

    fn is_step_valid(&self, x0: &Vector, x1: &Vector) -> bool {
        self.objective.is_step_valid(x0, x1)
    }

    fn max_step_size(&self, x0: &Vector, x1: &Vector) -> f64 {
        self.objective.max_step_size(x0, x1)
    }

    fn solution_changed(&mut self, _x: &Vector) {}
}
