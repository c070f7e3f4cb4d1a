use weft_core::{Form, Weight};

use crate::{FormError, WeightedForm, error::positive};

/// Augmented-Lagrangian penalty schedule.
///
/// The penalty weight starts at `initial_weight` and is multiplied by a growth
/// factor after every outer iteration whose constraint error is still above
/// the tolerance, never exceeding `max_weight`. With `force` set the penalty is
/// applied even when the starting point already satisfies the constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct AlWeightPolicy {
    initial: Weight,
    max: Weight,
    force: bool,
    growth: f64,
    tolerance: f64,
    current: Weight,
}

impl AlWeightPolicy {
    const DEFAULT_GROWTH: f64 = 2.0;
    const DEFAULT_TOLERANCE: f64 = 1e-5;

    /// Creates a schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if either weight is not positive and finite, or if
    /// `initial_weight > max_weight`.
    pub fn new(initial_weight: f64, max_weight: f64, force: bool) -> Result<Self, FormError> {
        let initial = positive("augmented lagrangian", "initial_weight", initial_weight)?;
        let max = positive("augmented lagrangian", "max_weight", max_weight)?;
        let (initial, max) = (Weight::new(initial)?, Weight::new(max)?);
        if initial > max {
            return Err(FormError::InvalidSchedule {
                initial: initial.get(),
                max: max.get(),
            });
        }
        Ok(Self {
            initial,
            max,
            force,
            growth: Self::DEFAULT_GROWTH,
            tolerance: Self::DEFAULT_TOLERANCE,
            current: initial,
        })
    }

    /// Sets the factor applied on every unsatisfied outer iteration.
    ///
    /// # Errors
    ///
    /// Returns an error unless `growth > 1`.
    pub fn with_growth(mut self, growth: f64) -> Result<Self, FormError> {
        if !growth.is_finite() || growth <= 1.0 {
            return Err(FormError::InvalidParameter {
                form: "augmented lagrangian",
                parameter: "growth",
                value: growth,
            });
        }
        self.growth = growth;
        Ok(self)
    }

    /// Sets the constraint error considered satisfied.
    ///
    /// # Errors
    ///
    /// Returns an error if `tolerance` is not positive.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, FormError> {
        self.tolerance = positive("augmented lagrangian", "tolerance", tolerance)?;
        Ok(self)
    }

    /// Returns the current penalty weight.
    pub fn current(&self) -> Weight {
        self.current
    }

    /// Returns `true` if the penalty must be enabled for a constraint error.
    pub fn is_required(&self, constraint_error: f64) -> bool {
        self.force || constraint_error > self.tolerance
    }

    /// Advances the schedule after an outer iteration and returns the new weight.
    pub fn update(&mut self, constraint_error: f64) -> Weight {
        if constraint_error > self.tolerance {
            // A product too large to be a weight is past the cap as well.
            self.current = match Weight::new(self.current.get() * self.growth) {
                Ok(grown) if grown < self.max => grown,
                _ => self.max,
            };
        }
        self.current
    }

    /// Advances the schedule and writes the weight into `member`.
    ///
    /// The new weight is logged under `target`.
    pub fn apply<F: Form>(
        &mut self,
        member: &mut WeightedForm<F>,
        constraint_error: f64,
        target: &str,
    ) -> Weight {
        let weight = self.update(constraint_error);
        member.set_weight(weight);
        log::debug!(
            target: target,
            "augmented lagrangian: error {constraint_error:.3e}, weight {:.3e}",
            weight.get()
        );
        weight
    }

    /// Restarts the schedule at the initial weight.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
