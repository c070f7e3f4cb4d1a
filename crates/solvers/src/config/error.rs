use thiserror::Error;
use weft_forms::FormError;

use crate::nonlinear;

/// Errors raised while reading or resolving a configuration.
///
/// All of them are fatal and are reported before any solve starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("exactly two of (tend, dt, time_steps) must be specified")]
    TimeUnderdetermined,

    #[error("tend, dt and time_steps disagree: t0 + dt * time_steps = {computed}, tend = {tend}")]
    TimeInconsistent { computed: f64, tend: f64 },

    #[error("time.{key} is invalid: {value}")]
    InvalidTime { key: &'static str, value: f64 },

    #[error("{key} is invalid: {value}")]
    InvalidValue { key: &'static str, value: f64 },

    #[error("{section}: {source}")]
    Nonlinear {
        section: &'static str,
        #[source]
        source: nonlinear::ConfigError,
    },

    #[error("solver.augmented_lagrangian: {0}")]
    Schedule(#[from] FormError),

    #[error("output.optimization.save_frequency must be at least 1")]
    SaveFrequency,
}
