use std::fmt;

use weft_core::{ForwardSolve, Parameterization, Problem, ProblemError, RunContext, Vector};
use weft_forms::CompositeForm;
use weft_params::CompositeParameterization;

use super::{Checkpoint, Error, Record};

/// Forward solve results for one design vector.
struct Cache {
    x: Vector,
    field: Vector,
    state: Vector,
    value: Option<f64>,
    gradient: Option<Vector>,
}

/// Bridges a parameterized forward solve and an objective to the [`Problem`]
/// contract.
///
/// The forward solve runs at most once per distinct `x`: value and gradient
/// queries at the same point share the cached field and state. Before a line
/// search the state at its start is kept in `sol_at_ls_begin` and handed to
/// every trial solve as a warm start.
///
/// Lagged forms in the objective are initialized from the first successful
/// forward solve and refreshed in [`Problem::post_step`], which also writes a
/// [`Record`] to the checkpoint every `save_frequency` iterations.
pub struct OptimizationProblem<'s, S, C = ()> {
    solver: &'s S,
    parameterization: CompositeParameterization,
    objective: CompositeForm,
    regularization: Option<CompositeForm>,
    checkpoint: C,
    save_frequency: usize,
    ctx: RunContext,
    cache: Option<Cache>,
    sol_at_ls_begin: Option<Vector>,
    x_at_ls_begin: Option<Vector>,
    cur_val: Option<f64>,
    cur_grad: Option<Vector>,
    iter: usize,
    lagging_ready: bool,
}

impl<'s, S: ForwardSolve> OptimizationProblem<'s, S> {
    /// Creates a problem without regularization or checkpointing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldSize`] if the chain's output size differs from the
    /// solver's field size.
    pub fn new(
        solver: &'s S,
        parameterization: CompositeParameterization,
        objective: CompositeForm,
        ctx: &RunContext,
    ) -> Result<Self, Error> {
        let expected = solver.field_size();
        let found = parameterization.output_size();
        if expected != found {
            return Err(Error::FieldSize { expected, found });
        }

        log::info!(
            target: ctx.target(),
            "design optimization: {} design variables through {} stages into {expected} field entries",
            parameterization.input_size(),
            parameterization.len(),
        );

        Ok(Self {
            solver,
            parameterization,
            objective,
            regularization: None,
            checkpoint: (),
            save_frequency: 1,
            ctx: ctx.clone(),
            cache: None,
            sol_at_ls_begin: None,
            x_at_ls_begin: None,
            cur_val: None,
            cur_grad: None,
            iter: 0,
            lagging_ready: false,
        })
    }
}

impl<'s, S: ForwardSolve, C: Checkpoint> OptimizationProblem<'s, S, C> {
    /// Adds a regularization objective evaluated on the physical field.
    #[must_use]
    pub fn with_regularization(mut self, regularization: CompositeForm) -> Self {
        self.regularization = Some(regularization);
        self
    }

    /// Replaces the checkpoint, saving every `save_frequency` iterations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SaveFrequency`] if `save_frequency` is zero.
    pub fn with_checkpoint<C2: Checkpoint>(
        self,
        checkpoint: C2,
        save_frequency: usize,
    ) -> Result<OptimizationProblem<'s, S, C2>, Error> {
        if save_frequency == 0 {
            return Err(Error::SaveFrequency);
        }
        Ok(OptimizationProblem {
            solver: self.solver,
            parameterization: self.parameterization,
            objective: self.objective,
            regularization: self.regularization,
            checkpoint,
            save_frequency,
            ctx: self.ctx,
            cache: self.cache,
            sol_at_ls_begin: self.sol_at_ls_begin,
            x_at_ls_begin: self.x_at_ls_begin,
            cur_val: self.cur_val,
            cur_grad: self.cur_grad,
            iter: self.iter,
            lagging_ready: self.lagging_ready,
        })
    }

    /// Maps a physical field back to design variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `field` is not of the chain's output size or a
    /// stage of the chain has no inverse.
    pub fn initial_guess(&self, field: &Vector) -> Result<Vector, Error> {
        Ok(self.parameterization.inverse_eval(field)?)
    }

    /// Returns the number of completed iterations.
    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Returns the objective value at the start of the last line search.
    pub fn current_value(&self) -> Option<f64> {
        self.cur_val
    }

    /// Returns the gradient at the start of the last line search.
    pub fn current_gradient(&self) -> Option<&Vector> {
        self.cur_grad.as_ref()
    }

    /// Returns the design vector at the start of the last line search.
    pub fn x_at_line_search_begin(&self) -> Option<&Vector> {
        self.x_at_ls_begin.as_ref()
    }

    /// Returns the most recent physical field.
    pub fn field(&self) -> Option<&Vector> {
        self.cache.as_ref().map(|cache| &cache.field)
    }

    /// Returns the most recent physical state.
    pub fn state(&self) -> Option<&Vector> {
        self.cache.as_ref().map(|cache| &cache.state)
    }

    /// Returns the objective.
    pub fn objective(&self) -> &CompositeForm {
        &self.objective
    }

    /// Returns the parameterization chain.
    pub fn parameterization(&self) -> &CompositeParameterization {
        &self.parameterization
    }

    /// Returns the checkpoint.
    pub fn checkpoint(&self) -> &C {
        &self.checkpoint
    }

    /// Consumes the problem and returns the checkpoint.
    pub fn into_checkpoint(self) -> C {
        self.checkpoint
    }

    /// Runs the forward solve at `x` unless its result is already cached.
    ///
    /// Warm-starts from the state at the beginning of the current line search
    /// when there is one, otherwise from the last cached state.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError::Rejected`] if the forward solve fails.
    pub fn solve_pde(&mut self, x: &Vector) -> Result<(), ProblemError> {
        if self.cache.as_ref().is_some_and(|cache| cache.x == *x) {
            return Ok(());
        }

        let field = self.parameterization.eval(x);
        let warm_start = self
            .sol_at_ls_begin
            .as_ref()
            .or(self.cache.as_ref().map(|cache| &cache.state));
        let state = self.solver.solve(&field, warm_start).map_err(|err| {
            log::warn!(target: self.ctx.target(), "forward solve failed: {err}");
            ProblemError::rejected(err.to_string())
        })?;

        if !self.lagging_ready {
            self.objective.init_lagging(&state);
            if let Some(regularization) = &mut self.regularization {
                regularization.init_lagging(&field);
            }
            self.lagging_ready = true;
        }

        self.cache = Some(Cache {
            x: x.clone(),
            field,
            state,
            value: None,
            gradient: None,
        });
        Ok(())
    }

    fn uses_lagging(&self) -> bool {
        self.objective.uses_lagging()
            || self
                .regularization
                .as_ref()
                .is_some_and(CompositeForm::uses_lagging)
    }

    fn save(&mut self, x: &Vector) {
        let Some(cache) = self.cache.as_ref().filter(|cache| cache.x == *x) else {
            log::warn!(target: self.ctx.target(), "no forward state to checkpoint at iteration {}", self.iter);
            return;
        };
        let record = Record {
            iter: self.iter,
            value: cache.value,
            x: x.to_vec(),
            field: cache.field.to_vec(),
            state: cache.state.to_vec(),
        };
        if let Err(err) = self.checkpoint.save(&record) {
            log::warn!(target: self.ctx.target(), "checkpoint at iteration {} failed: {err}", self.iter);
        }
    }
}

fn missing_state() -> ProblemError {
    ProblemError::rejected("forward state is unavailable")
}

impl<S: ForwardSolve, C: Checkpoint> Problem for OptimizationProblem<'_, S, C> {
    fn value(&mut self, x: &Vector) -> Result<f64, ProblemError> {
        self.solve_pde(x)?;
        let cache = self.cache.as_mut().ok_or_else(missing_state)?;
        if let Some(value) = cache.value {
            return Ok(value);
        }

        let mut value = self.objective.value(&cache.state);
        if let Some(regularization) = &self.regularization {
            value += regularization.value(&cache.field);
        }
        if !value.is_finite() {
            return Err(ProblemError::rejected(format!("objective is {value}")));
        }

        cache.value = Some(value);
        Ok(value)
    }

    fn gradient(&mut self, x: &Vector) -> Result<Vector, ProblemError> {
        self.solve_pde(x)?;
        let cache = self.cache.as_mut().ok_or_else(missing_state)?;
        if let Some(gradient) = &cache.gradient {
            return Ok(gradient.clone());
        }

        let grad_state = self.objective.gradient(&cache.state);
        let mut grad_field = self
            .solver
            .adjoint(&cache.field, &cache.state, &grad_state)
            .map_err(|err| {
                log::warn!(target: self.ctx.target(), "adjoint solve failed: {err}");
                ProblemError::rejected(err.to_string())
            })?;
        if let Some(regularization) = &self.regularization {
            grad_field += &regularization.gradient(&cache.field);
        }

        let gradient = self.parameterization.apply_jacobian(&grad_field, x);
        cache.gradient = Some(gradient.clone());
        Ok(gradient)
    }

    fn line_search_begin(&mut self, x0: &Vector, _x1: &Vector) {
        if let Err(err) = self.solve_pde(x0) {
            log::warn!(target: self.ctx.target(), "line search starts without a forward state: {err}");
        }
        let cache = self.cache.as_ref().filter(|cache| cache.x == *x0);
        self.sol_at_ls_begin = cache.map(|cache| cache.state.clone());
        self.cur_val = cache.and_then(|cache| cache.value);
        self.cur_grad = cache.and_then(|cache| cache.gradient.clone());
        self.x_at_ls_begin = Some(x0.clone());
        log::trace!(target: self.ctx.target(), "line search begins at f = {:?}", self.cur_val);
    }

    fn line_search_end(&mut self) {
        log::trace!(target: self.ctx.target(), "line search ends");
    }

    fn post_step(&mut self, iter: usize, x: &Vector) {
        self.iter += 1;

        let lagging = self.uses_lagging();
        if let Some(cache) = self.cache.as_mut().filter(|cache| cache.x == *x) {
            self.objective.update_lagging(&cache.state);
            if let Some(regularization) = &mut self.regularization {
                regularization.update_lagging(&cache.field);
            }
            if lagging {
                cache.value = None;
                cache.gradient = None;
            }
        }

        if self.iter % self.save_frequency == 0 {
            self.save(x);
        }
        log::debug!(target: self.ctx.target(), "design iteration {iter} accepted");
    }

    fn solution_changed(&mut self, x: &Vector) {
        if let Err(err) = self.solve_pde(x) {
            log::warn!(target: self.ctx.target(), "accepted design has no forward state: {err}");
        }
    }
}

impl<S, C> fmt::Debug for OptimizationProblem<'_, S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationProblem")
            .field("parameterization", &self.parameterization)
            .field("objective", &self.objective)
            .field("regularization", &self.regularization)
            .field("save_frequency", &self.save_frequency)
            .field("iter", &self.iter)
            .finish_non_exhaustive()
    }
}
