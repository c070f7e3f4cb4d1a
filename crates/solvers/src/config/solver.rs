use serde::Deserialize;

use super::ConfigError;
use crate::nonlinear::{self, LineSearch, Method};

/// The `solver` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverArgs {
    pub nonlinear: NonlinearArgs,
    pub optimization_nonlinear: NonlinearArgs,
    pub augmented_lagrangian: AugmentedLagrangianArgs,
    pub contact: ContactSolverArgs,
}

/// A minimizer section.
///
/// Keys left out take the defaults of the section they appear in, so the
/// forward and design minimizers can differ.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NonlinearArgs {
    pub solver: Option<Method>,
    pub f_delta: Option<f64>,
    pub grad_norm: Option<f64>,
    pub min_step_size: Option<f64>,
    pub max_iterations: Option<usize>,
    pub line_search: LineSearchArgs,
}

pub(super) struct Defaults {
    method: Method,
    f_delta: f64,
    grad_norm: f64,
    max_iterations: usize,
}

impl NonlinearArgs {
    pub(super) const FORWARD_DEFAULTS: Defaults = Defaults {
        method: Method::Newton,
        f_delta: 1e-10,
        grad_norm: 1e-8,
        max_iterations: 1000,
    };

    pub(super) const OPTIMIZATION_DEFAULTS: Defaults = Defaults {
        method: Method::Lbfgs,
        f_delta: 1e-9,
        grad_norm: 1e-7,
        max_iterations: 100,
    };

    pub(super) fn resolve(
        &self,
        section: &'static str,
        defaults: &Defaults,
    ) -> Result<nonlinear::Config, ConfigError> {
        nonlinear::Config::new(
            self.solver.unwrap_or(defaults.method),
            self.max_iterations.unwrap_or(defaults.max_iterations),
            self.grad_norm.unwrap_or(defaults.grad_norm),
            self.f_delta.unwrap_or(defaults.f_delta),
        )
        .and_then(|config| {
            config.with_line_search(
                self.line_search.method,
                self.min_step_size.unwrap_or(0.0),
                self.line_search.max_iterations,
            )
        })
        .map_err(|source| ConfigError::Nonlinear { section, source })
    }
}

/// The `line_search` subsection of a minimizer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LineSearchArgs {
    pub method: LineSearch,
    pub max_iterations: usize,
}

impl Default for LineSearchArgs {
    fn default() -> Self {
        Self {
            method: LineSearch::Backtracking,
            max_iterations: 30,
        }
    }
}

/// The `solver.augmented_lagrangian` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AugmentedLagrangianArgs {
    pub initial_weight: f64,
    pub max_weight: f64,
    pub force: bool,
}

impl Default for AugmentedLagrangianArgs {
    fn default() -> Self {
        Self {
            initial_weight: 1e6,
            max_weight: 1e11,
            force: false,
        }
    }
}

/// The `solver.contact` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactSolverArgs {
    /// Lagging updates for friction; negative means unbounded.
    pub friction_iterations: i64,
    pub friction_convergence_tol: f64,
    pub barrier_stiffness: f64,
    pub lagged_damping_weight: f64,
    #[serde(rename = "CCD")]
    pub ccd: CcdArgs,
}

impl Default for ContactSolverArgs {
    fn default() -> Self {
        Self {
            friction_iterations: 1,
            friction_convergence_tol: 1e-2,
            barrier_stiffness: 1.0,
            lagged_damping_weight: 0.0,
            ccd: CcdArgs::default(),
        }
    }
}

/// Broad-phase method of continuous collision detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BroadPhase {
    #[default]
    #[serde(rename = "hash_grid", alias = "HG")]
    HashGrid,

    #[serde(rename = "brute_force", alias = "BF")]
    BruteForce,

    #[serde(rename = "spatial_hash", alias = "SH")]
    SpatialHash,

    #[serde(rename = "sweep_and_tiniest_queue", alias = "STQ")]
    SweepAndTiniestQueue,
}

/// The `solver.contact.CCD` subsection.
///
/// `max_iterations` is read as a number so that `1e6` is accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CcdArgs {
    pub broad_phase: BroadPhase,
    pub tolerance: f64,
    /// Root-finding iterations; negative means unbounded.
    pub max_iterations: f64,
}

impl Default for CcdArgs {
    fn default() -> Self {
        Self {
            broad_phase: BroadPhase::HashGrid,
            tolerance: 1e-6,
            max_iterations: 1e6,
        }
    }
}

/// Validated collision-detection settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdSettings {
    pub broad_phase: BroadPhase,
    pub tolerance: f64,
    /// `None` when unbounded.
    pub max_iterations: Option<usize>,
}

impl CcdArgs {
    pub(super) fn resolve(&self) -> Result<CcdSettings, ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "solver.contact.CCD.tolerance",
                value: self.tolerance,
            });
        }

        let iterations = self.max_iterations;
        if iterations.is_nan() || iterations.fract() != 0.0 || iterations == 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "solver.contact.CCD.max_iterations",
                value: iterations,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_iterations = (iterations > 0.0).then(|| iterations.min(usize::MAX as f64) as usize);

        Ok(CcdSettings {
            broad_phase: self.broad_phase,
            tolerance: self.tolerance,
            max_iterations,
        })
    }
}
