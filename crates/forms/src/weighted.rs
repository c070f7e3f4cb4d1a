use weft_core::{Form, Hessian, LagPhase, Vector, Weight};

/// A form together with its weight, enabled flag, and lagging phase.
///
/// This is the base contract every term is evaluated through: `value`,
/// `gradient`, and `hessian` scale the form's unweighted math by the stored
/// weight, so changing the weight (for example from an augmented-Lagrangian
/// schedule) never touches the form itself.
///
/// A disabled form contributes zero value and gradient, and a Hessian whose
/// stored entries are all zero but whose pattern is unchanged.
///
/// In debug builds, evaluating a lagging form before
/// [`WeightedForm::init_lagging`] panics.
#[derive(Debug, Clone)]
pub struct WeightedForm<F> {
    form: F,
    weight: Weight,
    enabled: bool,
    phase: LagPhase,
}

impl<F: Form> WeightedForm<F> {
    /// Wraps `form` with unit weight.
    pub fn new(form: F) -> Self {
        Self::with_weight(form, Weight::ONE)
    }

    /// Wraps `form` with the given weight.
    pub fn with_weight(form: F, weight: Weight) -> Self {
        Self {
            form,
            weight,
            enabled: true,
            phase: LagPhase::Uninitialized,
        }
    }

    /// Returns the wrapped form.
    pub fn form(&self) -> &F {
        &self.form
    }

    /// Returns the wrapped form mutably.
    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    /// Returns the form's name.
    pub fn name(&self) -> &str {
        self.form.name()
    }

    /// Returns the current weight.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Replaces the weight.
    pub fn set_weight(&mut self, weight: Weight) {
        self.weight = weight;
    }

    /// Returns `true` if the form contributes to evaluations.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the form.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the lagging phase.
    pub fn phase(&self) -> LagPhase {
        self.phase
    }

    /// Returns the weighted value at `x`.
    pub fn value(&self, x: &Vector) -> f64 {
        self.debug_check_ready();
        if !self.enabled {
            return 0.0;
        }
        self.weight.get() * self.form.value_unweighted(x)
    }

    /// Returns the weighted gradient at `x`.
    pub fn gradient(&self, x: &Vector) -> Vector {
        self.debug_check_ready();
        if !self.enabled {
            return Vector::zeros(x.len());
        }
        self.form.first_derivative_unweighted(x) * self.weight.get()
    }

    /// Returns the weighted Hessian at `x`.
    pub fn hessian(&self, x: &Vector) -> Hessian {
        self.debug_check_ready();
        let mut hessian = self.form.second_derivative_unweighted(x);
        if self.enabled {
            let weight = self.weight.get();
            hessian.map_inplace(|v| weight * v);
        } else {
            hessian.map_inplace(|_| 0.0);
        }
        hessian
    }

    /// Captures the lagged reference at the start of an outer loop.
    pub fn init_lagging(&mut self, x: &Vector) {
        self.form.init_lagging(x);
        self.phase = LagPhase::Ready;
    }

    /// Refreshes the lagged reference to `x`.
    pub fn update_lagging(&mut self, x: &Vector) {
        debug_assert!(
            !self.form.uses_lagging() || self.phase == LagPhase::Ready,
            "update_lagging called on `{}` before init_lagging",
            self.form.name()
        );
        self.form.update_lagging(x);
        self.phase = LagPhase::Ready;
    }

    /// Returns `false` if an enabled form rejects the step `x0 -> x1`.
    pub fn is_step_valid(&self, x0: &Vector, x1: &Vector) -> bool {
        !self.enabled || self.form.is_step_valid(x0, x1)
    }

    /// Returns the largest admissible step fraction for an enabled form.
    pub fn max_step_size(&self, x0: &Vector, x1: &Vector) -> f64 {
        if self.enabled {
            self.form.max_step_size(x0, x1)
        } else {
            1.0
        }
    }

    fn debug_check_ready(&self) {
        debug_assert!(
            !self.form.uses_lagging() || self.phase == LagPhase::Ready,
            "`{}` evaluated before init_lagging",
            self.form.name()
        );
    }
}
