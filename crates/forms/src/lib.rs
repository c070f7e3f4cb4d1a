//! Weighted energy forms and composite objectives.
//!
//! A [`Form`](weft_core::Form) supplies unweighted math. This crate wraps
//! forms with a weight and an explicit lagging phase ([`WeightedForm`]), sums
//! them into one differentiable objective ([`CompositeForm`]), and provides
//! concrete terms:
//!
//! - [`LaggedRegForm`] — quadratic pull toward a lagged reference state
//! - [`ElasticForm`] — quadratic elastic potential with a fixed stiffness
//! - [`BarrierForm`] — log barrier keeping coordinates above an obstacle
//! - [`FrictionForm`] — smoothed friction with lagged normal forces
//! - [`AugmentedLagrangianForm`] — penalty pulling selected coordinates to targets
//!
//! [`AlWeightPolicy`] rewrites a penalty weight between outer iterations, and
//! [`fd`] holds finite-difference helpers for verifying derivatives.

mod al_policy;
mod augmented_lagrangian;
mod barrier;
mod composite;
mod elastic;
mod error;
mod friction;
mod lagged_reg;
mod weighted;

pub mod fd;

pub use al_policy::AlWeightPolicy;
pub use augmented_lagrangian::AugmentedLagrangianForm;
pub use barrier::BarrierForm;
pub use composite::{CompositeForm, DynForm};
pub use elastic::ElasticForm;
pub use error::FormError;
pub use friction::FrictionForm;
pub use lagged_reg::LaggedRegForm;
pub use weighted::WeightedForm;
