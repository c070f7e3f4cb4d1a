//! Run configuration.
//!
//! [`Args`] mirrors the JSON a run is configured with. Every section rejects
//! unknown keys and fills missing keys with defaults. [`Args::resolve`]
//! validates the values, applies the contact and friction normalization rules,
//! and produces the typed [`Settings`] the solvers are built from.
//!
//! ```
//! use weft_core::RunContext;
//! use weft_solvers::config::Args;
//!
//! let args = Args::from_json(r#"{ "time": { "tend": 2.0, "dt": 0.5 } }"#).unwrap();
//! let settings = args.resolve(&RunContext::default()).unwrap();
//! assert_eq!(settings.time.unwrap().time_steps, 4);
//! ```

mod contact;
mod error;
mod output;
mod solver;
mod time;

pub use contact::{ContactArgs, ContactSettings};
pub use error::ConfigError;
pub use output::{OptimizationOutputArgs, OutputArgs};
pub use solver::{
    AugmentedLagrangianArgs, BroadPhase, CcdArgs, CcdSettings, ContactSolverArgs, LineSearchArgs,
    NonlinearArgs, SolverArgs,
};
pub use time::{BdfArgs, Integrator, NewmarkArgs, TimeArgs, TimeIntegrator, TimeSchedule};

use serde::Deserialize;
use weft_core::{RunContext, Weight};
use weft_forms::AlWeightPolicy;

use crate::{nonlinear, staggered};

/// Top-level run configuration as read from JSON.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Args {
    pub time: Option<TimeArgs>,
    pub contact: ContactArgs,
    pub solver: SolverArgs,
    pub output: OutputArgs,
}

/// Validated, normalized settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Resolved time schedule, if the run is transient.
    pub time: Option<TimeSchedule>,

    /// Contact parameters after normalization.
    pub contact: ContactSettings,

    /// Outer lagging loop for friction.
    pub friction: staggered::Config,

    /// Weight of the contact barrier.
    pub barrier_stiffness: Weight,

    /// Weight of the lagged damping term.
    pub lagged_damping_weight: Weight,

    /// Continuous collision detection used to cap contact steps.
    pub ccd: CcdSettings,

    /// Minimizer for the forward solve.
    pub nonlinear: nonlinear::Config,

    /// Minimizer for design optimization.
    pub optimization_nonlinear: nonlinear::Config,

    /// Penalty schedule for augmented-Lagrangian terms.
    pub augmented_lagrangian: AlWeightPolicy,

    /// Checkpoint every this many design iterations.
    pub save_frequency: usize,
}

impl Args {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON, unknown keys, or
    /// values of the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates and normalizes the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed time schedule, contradictory penalty
    /// weights, or out-of-range tolerances.
    pub fn resolve(&self, ctx: &RunContext) -> Result<Settings, ConfigError> {
        let target = ctx.target();

        let time = self.time.as_ref().map(TimeArgs::resolve).transpose()?;
        if let Some(time) = &time {
            log::info!(target: target, "t0={}, dt={}, tend={}", time.t0, time.dt, time.tend);
        }

        let (contact, max_lagging_iters) = self.contact.normalize(&self.solver.contact, target)?;
        let contact_solver = &self.solver.contact;
        let friction = staggered::Config::new(
            max_lagging_iters,
            non_negative("solver.contact.friction_convergence_tol", contact_solver.friction_convergence_tol)?,
        );

        let al = &self.solver.augmented_lagrangian;
        let augmented_lagrangian = AlWeightPolicy::new(al.initial_weight, al.max_weight, al.force)?;

        let save_frequency = self.output.optimization.save_frequency;
        if save_frequency == 0 {
            return Err(ConfigError::SaveFrequency);
        }

        Ok(Settings {
            time,
            contact,
            friction,
            barrier_stiffness: weight("solver.contact.barrier_stiffness", contact_solver.barrier_stiffness)?,
            lagged_damping_weight: weight(
                "solver.contact.lagged_damping_weight",
                contact_solver.lagged_damping_weight,
            )?,
            ccd: contact_solver.ccd.resolve()?,
            nonlinear: self
                .solver
                .nonlinear
                .resolve("solver.nonlinear", &NonlinearArgs::FORWARD_DEFAULTS)?
                .with_target(target),
            optimization_nonlinear: self
                .solver
                .optimization_nonlinear
                .resolve("solver.optimization_nonlinear", &NonlinearArgs::OPTIMIZATION_DEFAULTS)?
                .with_target(target),
            augmented_lagrangian,
            save_frequency,
        })
    }
}

fn non_negative(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { key, value })
    }
}

fn weight(key: &'static str, value: f64) -> Result<Weight, ConfigError> {
    Weight::new(value).map_err(|_| ConfigError::InvalidValue { key, value })
}
