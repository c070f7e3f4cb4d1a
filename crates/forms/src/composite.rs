use std::fmt;

use weft_core::{Form, Hessian, Vector, Weight, linalg::HessianBuilder};

use crate::{FormError, WeightedForm};

/// A type-erased form, as stored by [`CompositeForm`].
pub type DynForm = Box<dyn Form>;

/// The total objective: an ordered, non-empty sum of weighted forms.
///
/// Insertion order is summation order. Every member contributes a full-size
/// gradient and a fixed-pattern Hessian, so the assembled Hessian has the same
/// pattern at every `x` of a given dimension, across outer iterations.
///
/// The lagging lifecycle is applied uniformly: `init_lagging` once at the
/// start of an outer loop, `update_lagging` between outer iterations, and any
/// number of idempotent evaluations in between.
pub struct CompositeForm {
    forms: Vec<WeightedForm<DynForm>>,
}

impl CompositeForm {
    /// Creates a composite from weighted members.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Empty`] if `forms` is empty.
    pub fn new(forms: Vec<WeightedForm<DynForm>>) -> Result<Self, FormError> {
        if forms.is_empty() {
            return Err(FormError::Empty);
        }
        Ok(Self { forms })
    }

    /// Creates a composite holding a single unit-weight form.
    pub fn single(form: impl Form + 'static) -> Self {
        Self {
            forms: vec![WeightedForm::new(Box::new(form))],
        }
    }

    /// Appends a form with the given weight and returns its index.
    pub fn push(&mut self, form: impl Form + 'static, weight: Weight) -> usize {
        self.forms
            .push(WeightedForm::with_weight(Box::new(form), weight));
        self.forms.len() - 1
    }

    /// Builder-style variant of [`CompositeForm::push`].
    #[must_use]
    pub fn with(mut self, form: impl Form + 'static, weight: Weight) -> Self {
        self.push(form, weight);
        self
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// Always `false`; a composite is never empty.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Returns the member at `index`.
    pub fn get(&self, index: usize) -> Option<&WeightedForm<DynForm>> {
        self.forms.get(index)
    }

    /// Returns the member at `index` mutably, for example to rewrite its weight.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut WeightedForm<DynForm>> {
        self.forms.get_mut(index)
    }

    /// Iterates over the members in summation order.
    pub fn iter(&self) -> impl Iterator<Item = &WeightedForm<DynForm>> {
        self.forms.iter()
    }

    /// Returns `true` if any member keeps lagged state.
    pub fn uses_lagging(&self) -> bool {
        self.forms.iter().any(|f| f.form().uses_lagging())
    }

    /// Sums the weighted member values.
    pub fn value(&self, x: &Vector) -> f64 {
        self.forms.iter().map(|f| f.value(x)).sum()
    }

    /// Sums the weighted member gradients.
    pub fn gradient(&self, x: &Vector) -> Vector {
        let mut gradient = Vector::zeros(x.len());
        for form in &self.forms {
            gradient += &form.gradient(x);
        }
        gradient
    }

    /// Sums the weighted member Hessians, keeping every stored entry.
    pub fn hessian(&self, x: &Vector) -> Hessian {
        let mut builder = HessianBuilder::new(x.len());
        for form in &self.forms {
            builder.add(&form.hessian(x), 1.0);
        }
        builder.build()
    }

    /// Captures the lagged reference of every member.
    pub fn init_lagging(&mut self, x: &Vector) {
        for form in &mut self.forms {
            form.init_lagging(x);
        }
    }

    /// Refreshes the lagged reference of every member.
    pub fn update_lagging(&mut self, x: &Vector) {
        for form in &mut self.forms {
            form.update_lagging(x);
        }
    }

    /// Returns `true` if no member rejects the step `x0 -> x1`.
    pub fn is_step_valid(&self, x0: &Vector, x1: &Vector) -> bool {
        self.forms.iter().all(|f| f.is_step_valid(x0, x1))
    }

    /// Returns the smallest admissible step fraction over all members.
    pub fn max_step_size(&self, x0: &Vector, x1: &Vector) -> f64 {
        self.forms
            .iter()
            .map(|f| f.max_step_size(x0, x1))
            .fold(1.0, f64::min)
    }

    /// Logs each member's weighted value at `debug` level.
    pub fn log_values(&self, target: &str, x: &Vector) {
        if log::log_enabled!(target: target, log::Level::Debug) {
            for form in &self.forms {
                log::debug!(target: target, "{}: {:.6e}", form.name(), form.value(x));
            }
        }
    }
}

impl fmt::Debug for CompositeForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.forms.iter().map(|form| (form.name(), form.weight().get())))
            .finish()
    }
}
