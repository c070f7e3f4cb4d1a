use weft_core::{Form, Hessian, Vector, linalg};

use crate::{FormError, error::positive};

/// Fraction of the distance to first contact a clipped step may cover.
const STEP_SCALE: f64 = 0.8;

/// Log barrier keeping every coordinate above a fixed obstacle.
///
/// With gaps `d_i = x_i − lower_i` and activation distance `d̂`:
///
/// ```text
/// b(d) = −(d − d̂)² ln(d / d̂)   for 0 < d < d̂
///      = 0                       for d ≥ d̂
/// ```
///
/// The barrier is C² at `d̂` and grows without bound as a gap closes, so a
/// solver that never steps through the obstacle never produces an
/// interpenetrating configuration. The barrier stiffness is the owning form's
/// weight.
#[derive(Debug, Clone)]
pub struct BarrierForm {
    lower: Vector,
    dhat: f64,
}

impl BarrierForm {
    /// Creates a barrier against `lower` with activation distance `dhat`.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidParameter`] if `dhat` is not positive.
    pub fn new(lower: Vector, dhat: f64) -> Result<Self, FormError> {
        let dhat = positive("barrier", "dhat", dhat)?;
        Ok(Self { lower, dhat })
    }

    /// Returns the activation distance.
    pub fn dhat(&self) -> f64 {
        self.dhat
    }

    /// Returns the per-coordinate gaps `x − lower`.
    pub fn gaps(&self, x: &Vector) -> Vector {
        x - &self.lower
    }

    /// Returns `−b'(d_i)` per coordinate: the contact force magnitude each
    /// active gap exerts at unit barrier stiffness.
    pub fn contact_forces(&self, x: &Vector) -> Vector {
        self.gaps(x).mapv(|d| -barrier_first(d, self.dhat))
    }
}

impl Form for BarrierForm {
    fn name(&self) -> &str {
        "barrier"
    }

    fn value_unweighted(&self, x: &Vector) -> f64 {
        self.gaps(x).iter().map(|&d| barrier(d, self.dhat)).sum()
    }

    fn first_derivative_unweighted(&self, x: &Vector) -> Vector {
        self.gaps(x).mapv(|d| barrier_first(d, self.dhat))
    }

    fn second_derivative_unweighted(&self, x: &Vector) -> Hessian {
        linalg::diagonal(&self.gaps(x).mapv(|d| barrier_second(d, self.dhat)))
    }

    fn is_step_valid(&self, _x0: &Vector, x1: &Vector) -> bool {
        self.gaps(x1).iter().all(|&d| d > 0.0)
    }

    fn max_step_size(&self, x0: &Vector, x1: &Vector) -> f64 {
        let d0 = self.gaps(x0);
        let d1 = self.gaps(x1);
        let mut alpha: f64 = 1.0;
        for (&start, &end) in d0.iter().zip(d1.iter()) {
            if start <= 0.0 {
                return 0.0;
            }
            if end <= 0.0 {
                let time_of_contact = start / (start - end);
                alpha = alpha.min(STEP_SCALE * time_of_contact);
            }
        }
        alpha
    }
}

fn barrier(d: f64, dhat: f64) -> f64 {
    if d <= 0.0 {
        f64::INFINITY
    } else if d >= dhat {
        0.0
    } else {
        -(d - dhat).powi(2) * (d / dhat).ln()
    }
}

fn barrier_first(d: f64, dhat: f64) -> f64 {
    if d >= dhat {
        0.0
    } else {
        -2.0 * (d - dhat) * (d / dhat).ln() - (d - dhat).powi(2) / d
    }
}

fn barrier_second(d: f64, dhat: f64) -> f64 {
    if d >= dhat {
        0.0
    } else {
        -2.0 * (d / dhat).ln() - 4.0 * (d - dhat) / d + (d - dhat).powi(2) / (d * d)
    }
}
