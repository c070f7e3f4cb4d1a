use crate::Vector;

/// The forward physical solve consumed by design optimization.
///
/// Maps a physical field (material parameters, rest shape, loads, ...) to the
/// physical state that solves the discretized equations, and supplies the
/// adjoint needed to pull state gradients back onto the field.
///
/// Any internal parallelism is opaque to callers: a call blocks until the
/// solve returns.
pub trait ForwardSolve {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of entries the solve expects in a physical field.
    fn field_size(&self) -> usize;

    /// Solves for the physical state at `field`.
    ///
    /// `warm_start`, when given, is a previous state to use as the initial
    /// guess.
    ///
    /// # Errors
    ///
    /// Returns an error if the solve fails to converge or the field produces
    /// an invalid configuration.
    fn solve(&self, field: &Vector, warm_start: Option<&Vector>) -> Result<Vector, Self::Error>;

    /// Pulls `grad_state`, the gradient of a scalar with respect to the state
    /// returned by [`ForwardSolve::solve`], back to a gradient with respect to
    /// `field`.
    ///
    /// # Errors
    ///
    /// Returns an error if the adjoint system cannot be solved.
    fn adjoint(
        &self,
        field: &Vector,
        state: &Vector,
        grad_state: &Vector,
    ) -> Result<Vector, Self::Error>;
}
