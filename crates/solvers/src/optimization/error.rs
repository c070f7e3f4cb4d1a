use weft_core::ParamError;

/// Errors raised while setting up a design optimization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parameterization produces {found} field entries, the forward solve expects {expected}")]
    FieldSize { expected: usize, found: usize },

    #[error("save_frequency must be at least 1")]
    SaveFrequency,

    #[error(transparent)]
    Param(#[from] ParamError),
}
