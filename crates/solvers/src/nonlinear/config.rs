use serde::Deserialize;
use thiserror::Error;

/// Log target used until [`Config::with_target`] replaces it.
const DEFAULT_TARGET: &str = "weft";

/// Search direction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Method {
    #[serde(rename = "gradient_descent", alias = "GradientDescent")]
    GradientDescent,

    #[serde(rename = "lbfgs", alias = "L-BFGS")]
    Lbfgs,

    #[serde(rename = "newton", alias = "Newton")]
    Newton,
}

/// Step acceptance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LineSearch {
    /// Accept the first trial that does not increase the objective.
    #[default]
    #[serde(rename = "backtracking", alias = "Backtracking")]
    Backtracking,

    /// Accept the first trial with sufficient decrease along the direction.
    #[serde(rename = "armijo", alias = "Armijo")]
    Armijo,
}

/// Configuration for the nonlinear minimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    target: String,
    method: Method,
    max_iters: usize,
    grad_norm_tol: f64,
    f_delta_tol: f64,
    line_search: LineSearch,
    min_step_size: f64,
    max_line_search_iters: usize,
}

/// Errors that can occur when validating a minimizer config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grad_norm must be finite and non-negative")]
    GradNorm,

    #[error("f_delta must be finite and non-negative")]
    FDelta,

    #[error("min_step_size must be finite and in [0, 1)")]
    MinStepSize,

    #[error("the line search needs at least one trial")]
    LineSearchIters,
}

impl Default for Config {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(Method::Lbfgs, 100, 1e-7, 1e-9).unwrap()
    }
}

impl Config {
    /// Creates a config using a backtracking line search of at most 30 trials.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance is negative or non-finite.
    pub fn new(
        method: Method,
        max_iters: usize,
        grad_norm_tol: f64,
        f_delta_tol: f64,
    ) -> Result<Self, ConfigError> {
        if !grad_norm_tol.is_finite() || grad_norm_tol < 0.0 {
            return Err(ConfigError::GradNorm);
        }
        if !f_delta_tol.is_finite() || f_delta_tol < 0.0 {
            return Err(ConfigError::FDelta);
        }

        Ok(Self {
            target: String::from(DEFAULT_TARGET),
            method,
            max_iters,
            grad_norm_tol,
            f_delta_tol,
            line_search: LineSearch::Backtracking,
            min_step_size: 0.0,
            max_line_search_iters: 30,
        })
    }

    /// Replaces the line search settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `min_step_size` is outside `[0, 1)` or
    /// `max_trials` is zero.
    pub fn with_line_search(
        mut self,
        line_search: LineSearch,
        min_step_size: f64,
        max_trials: usize,
    ) -> Result<Self, ConfigError> {
        if !min_step_size.is_finite() || !(0.0..1.0).contains(&min_step_size) {
            return Err(ConfigError::MinStepSize);
        }
        if max_trials == 0 {
            return Err(ConfigError::LineSearchIters);
        }
        self.line_search = line_search;
        self.min_step_size = min_step_size;
        self.max_line_search_iters = max_trials;
        Ok(self)
    }

    /// Logs iterations under `target` instead of the default `"weft"`.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Returns the log target.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the search direction strategy.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the gradient norm considered converged.
    #[must_use]
    pub fn grad_norm_tol(&self) -> f64 {
        self.grad_norm_tol
    }

    /// Returns the objective change between iterations considered converged.
    #[must_use]
    pub fn f_delta_tol(&self) -> f64 {
        self.f_delta_tol
    }

    /// Returns the step acceptance rule.
    #[must_use]
    pub fn line_search(&self) -> LineSearch {
        self.line_search
    }

    /// Returns the smallest step fraction the line search tries.
    #[must_use]
    pub fn min_step_size(&self) -> f64 {
        self.min_step_size
    }

    /// Returns the maximum number of trials per line search.
    #[must_use]
    pub fn max_line_search_iters(&self) -> usize {
        self.max_line_search_iters
    }
}
