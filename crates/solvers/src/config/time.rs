use serde::Deserialize;

use super::ConfigError;

/// Allowed mismatch between `t0 + dt * time_steps` and `tend`.
const AGREEMENT_TOL: f64 = 1e-12;

/// The `time` section.
///
/// Exactly two of `tend`, `dt` and `time_steps` determine the schedule. All
/// three may be given only if they agree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeArgs {
    pub t0: f64,
    pub tend: Option<f64>,
    pub dt: Option<f64>,
    pub time_steps: Option<i64>,
    pub integrator: Integrator,
    pub newmark: NewmarkArgs,
    #[serde(rename = "BDF")]
    pub bdf: BdfArgs,
}

/// Time integrator names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Integrator {
    #[default]
    ImplicitEuler,
    ImplicitNewmark,
    #[serde(rename = "BDF")]
    Bdf,
}

/// The `time.newmark` subsection.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewmarkArgs {
    pub gamma: f64,
    pub beta: f64,
}

impl Default for NewmarkArgs {
    fn default() -> Self {
        Self {
            gamma: 0.5,
            beta: 0.25,
        }
    }
}

/// The `time.BDF` subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BdfArgs {
    pub steps: usize,
}

impl Default for BdfArgs {
    fn default() -> Self {
        Self { steps: 1 }
    }
}

/// A resolved time integrator with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeIntegrator {
    ImplicitEuler,
    ImplicitNewmark { gamma: f64, beta: f64 },
    Bdf { steps: usize },
}

/// A fully determined time schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSchedule {
    pub t0: f64,
    pub tend: f64,
    pub dt: f64,
    pub time_steps: usize,
    pub integrator: TimeIntegrator,
}

impl TimeArgs {
    /// Determines the missing one of `tend`, `dt` and `time_steps`.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two are given, if three are given and
    /// disagree, or if a value is out of range.
    pub fn resolve(&self) -> Result<TimeSchedule, ConfigError> {
        let t0 = finite("t0", self.t0)?;

        let (tend, dt, time_steps) = match (self.tend, self.dt, self.time_steps) {
            (Some(tend), Some(dt), Some(steps)) => {
                let dt = positive("dt", dt)?;
                let steps = steps_count(steps)?;
                let computed = t0 + dt * steps as f64;
                if (computed - tend).abs() > AGREEMENT_TOL {
                    return Err(ConfigError::TimeInconsistent { computed, tend });
                }
                (tend, dt, steps)
            }
            (Some(tend), Some(dt), None) => {
                let tend = after(t0, tend)?;
                let dt = positive("dt", dt)?;
                let steps = ((tend - t0) / dt).ceil() as usize;
                (tend, dt, steps)
            }
            (Some(tend), None, Some(steps)) => {
                let tend = after(t0, tend)?;
                let steps = steps_count(steps)?;
                (tend, (tend - t0) / steps as f64, steps)
            }
            (None, Some(dt), Some(steps)) => {
                let dt = positive("dt", dt)?;
                let steps = steps_count(steps)?;
                (t0 + steps as f64 * dt, dt, steps)
            }
            _ => return Err(ConfigError::TimeUnderdetermined),
        };

        let integrator = match self.integrator {
            Integrator::ImplicitEuler => TimeIntegrator::ImplicitEuler,
            Integrator::ImplicitNewmark => TimeIntegrator::ImplicitNewmark {
                gamma: positive("newmark.gamma", self.newmark.gamma)?,
                beta: positive("newmark.beta", self.newmark.beta)?,
            },
            Integrator::Bdf => {
                let steps = self.bdf.steps;
                if !(1..=6).contains(&steps) {
                    return Err(ConfigError::InvalidTime {
                        key: "BDF.steps",
                        value: steps as f64,
                    });
                }
                TimeIntegrator::Bdf { steps }
            }
        };

        Ok(TimeSchedule {
            t0,
            tend,
            dt,
            time_steps,
            integrator,
        })
    }
}

fn finite(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTime { key, value })
    }
}

fn positive(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTime { key, value })
    }
}

fn after(t0: f64, tend: f64) -> Result<f64, ConfigError> {
    if tend.is_finite() && tend > t0 {
        Ok(tend)
    } else {
        Err(ConfigError::InvalidTime {
            key: "tend",
            value: tend,
        })
    }
}

fn steps_count(steps: i64) -> Result<usize, ConfigError> {
    usize::try_from(steps)
        .ok()
        .filter(|&steps| steps > 0)
        .ok_or(ConfigError::InvalidTime {
            key: "time_steps",
            value: steps as f64,
        })
}
