//! Solvers driving Weft objectives.
//!
//! - [`config`] — strictly validated run configuration with the defaults of a
//!   simulation run
//! - [`nonlinear`] — a generic minimizer for any [`Problem`](weft_core::Problem)
//! - [`staggered`] — outer lagging loop around inner solves of a
//!   [`CompositeForm`](weft_forms::CompositeForm)
//! - [`optimization`] — the design-optimization bridge from a parameterized
//!   forward solve to the [`Problem`](weft_core::Problem) contract

pub mod config;
pub mod nonlinear;
pub mod optimization;
pub mod staggered;
