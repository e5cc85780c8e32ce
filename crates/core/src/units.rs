//! Reference simulation units with closed-form dynamics.
//!
//! These units integrate exactly, so driver behavior can be checked against
//! analytic trajectories:
//!
//! - [`Zigzag`]: `x` ramps with slope `±k` and reflects at `x = ±1` (state events)
//! - [`StepAt`]: `x` jumps from `0` to `1` at `t0` (time event)
//! - [`Sine`]: `x = sin(omega * t)`, optionally restricted to a fixed step

mod sine;
mod step_at;
mod zigzag;

pub use sine::Sine;
pub use step_at::StepAt;
pub use zigzag::Zigzag;

use thiserror::Error;

use crate::value::{ValueError, VarType};

/// Errors raised by the reference units.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UnitError {
    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("cannot advance backwards from {from} to {to}")]
    Backwards { from: f64, to: f64 },

    #[error("unit only advances in steps of {step}, requested {requested}")]
    StepMismatch { step: f64, requested: f64 },
}

/// Checks that a requested type matches the variable's declared type.
fn check_type(name: &str, declared: VarType, requested: VarType) -> Result<(), UnitError> {
    if declared == requested {
        Ok(())
    } else {
        Err(ValueError::TypeMismatch {
            name: name.to_owned(),
            expected: declared,
            found: requested,
        }
        .into())
    }
}

/// Rejects integration targets in the past.
fn check_forward(from: f64, to: f64) -> Result<(), UnitError> {
    if to < from {
        Err(UnitError::Backwards { from, to })
    } else {
        Ok(())
    }
}
