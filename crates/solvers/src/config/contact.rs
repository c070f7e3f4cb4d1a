use serde::Deserialize;

use super::{ConfigError, ContactSolverArgs, non_negative};

/// The `contact` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactArgs {
    pub enabled: bool,
    pub dhat: f64,
    pub epsv: f64,
    pub friction_coefficient: f64,
}

impl Default for ContactArgs {
    fn default() -> Self {
        Self {
            enabled: false,
            dhat: 1e-3,
            epsv: 1e-3,
            friction_coefficient: 0.0,
        }
    }
}

/// Contact parameters after normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSettings {
    pub enabled: bool,
    pub dhat: f64,
    pub epsv: f64,
    pub friction_coefficient: f64,
}

impl ContactSettings {
    /// Returns `true` if friction takes part in the solve.
    #[must_use]
    pub fn has_friction(&self) -> bool {
        self.enabled && self.friction_coefficient > 0.0
    }
}

impl ContactArgs {
    /// Applies the friction rules and returns the lagging budget.
    ///
    /// - disabled contact turns friction off entirely
    /// - zero friction iterations turn friction off
    /// - negative friction iterations mean no limit (`None`)
    /// - a zero friction coefficient needs no lagging iterations
    pub(super) fn normalize(
        &self,
        solver: &ContactSolverArgs,
        target: &str,
    ) -> Result<(ContactSettings, Option<usize>), ConfigError> {
        if !self.enabled {
            let settings = ContactSettings {
                enabled: false,
                dhat: self.dhat,
                epsv: self.epsv,
                friction_coefficient: 0.0,
            };
            return Ok((settings, Some(0)));
        }

        let dhat = positive("contact.dhat", self.dhat)?;
        let epsv = positive("contact.epsv", self.epsv)?;
        let mut friction_coefficient =
            non_negative("contact.friction_coefficient", self.friction_coefficient)?;

        let mut iterations = match solver.friction_iterations {
            0 => {
                log::info!(target: target, "specified friction_iterations is 0; disabling friction");
                friction_coefficient = 0.0;
                Some(0)
            }
            n if n < 0 => None,
            n => Some(usize::try_from(n).unwrap_or(usize::MAX)),
        };
        if friction_coefficient == 0.0 {
            iterations = Some(0);
        }

        let settings = ContactSettings {
            enabled: true,
            dhat,
            epsv,
            friction_coefficient,
        };
        Ok((settings, iterations))
    }
}

fn positive(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(enabled: bool, mu: f64, iterations: i64) -> (ContactSettings, Option<usize>) {
        let args = ContactArgs {
            enabled,
            friction_coefficient: mu,
            ..ContactArgs::default()
        };
        let solver = ContactSolverArgs {
            friction_iterations: iterations,
            ..ContactSolverArgs::default()
        };
        args.normalize(&solver, "test").unwrap()
    }

    #[test]
    fn disabled_contact_has_no_friction() {
        let (settings, iterations) = normalize(false, 0.5, 10);

        assert!(!settings.has_friction());
        assert_eq!(settings.friction_coefficient, 0.0);
        assert_eq!(iterations, Some(0));
    }

    #[test]
    fn zero_iterations_disable_friction() {
        let (settings, iterations) = normalize(true, 0.5, 0);

        assert_eq!(settings.friction_coefficient, 0.0);
        assert_eq!(iterations, Some(0));
    }

    #[test]
    fn negative_iterations_are_unbounded() {
        let (settings, iterations) = normalize(true, 0.5, -1);

        assert!(settings.has_friction());
        assert_eq!(iterations, None);
    }

    #[test]
    fn frictionless_contact_needs_no_lagging() {
        assert_eq!(normalize(true, 0.0, 5).1, Some(0));
        assert_eq!(normalize(true, 0.2, 5).1, Some(5));
    }

    #[test]
    fn rejects_non_positive_dhat() {
        let args = ContactArgs {
            enabled: true,
            dhat: 0.0,
            ..ContactArgs::default()
        };
        assert!(matches!(
            args.normalize(&ContactSolverArgs::default(), "test"),
            Err(ConfigError::InvalidValue { key: "contact.dhat", .. })
        ));
    }
}
