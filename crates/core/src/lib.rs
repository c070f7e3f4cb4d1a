//! Core traits and types for the Weft framework.
//!
//! This crate defines the shared abstractions that forms, parameterizations,
//! and solvers build on:
//!
//! - [`Form`] — a single scalar energy term with exact derivatives and an
//!   optional lagging protocol
//! - [`Parameterization`] — a differentiable vector map with reverse-mode
//!   gradient propagation
//! - [`ForwardSolve`] — the external physical solve consumed by design
//!   optimization
//! - [`Problem`] — the contract a generic nonlinear optimizer drives
//! - [`Observer`] — receives solver events and optionally returns control actions
//! - [`RunContext`] — explicit execution context threaded through constructors

mod context;
mod form;
mod forward;
mod observer;
mod parameterization;
mod problem;
mod weight;

pub mod linalg;

pub use context::RunContext;
pub use form::{Form, LagPhase};
pub use forward::ForwardSolve;
pub use linalg::{Hessian, Vector};
pub use observer::Observer;
pub use parameterization::{DimensionError, ParamError, Parameterization};
pub use problem::{Problem, ProblemError};
pub use weight::{Weight, WeightError};
