//! Design parameterizations and their composition.
//!
//! A [`CompositeParameterization`] chains [`Parameterization`] stages from
//! design variables to the physical field a forward solve consumes, checking
//! dimensions when the chain is built and folding gradients back through the
//! stages in reverse.

mod affine;
mod composite;
mod error;
mod exp;
mod per_element;
mod scatter;
mod sigmoid;

pub use affine::Affine;
pub use composite::{CompositeParameterization, SharedStage};
pub use error::BuildError;
pub use exp::Exp;
pub use per_element::PerElement;
pub use scatter::Scatter;
pub use sigmoid::BoundedSigmoid;

pub use weft_core::{DimensionError, ParamError, Parameterization};
