use std::error::Error as StdError;

use thiserror::Error;

use crate::snapshot::RollbackError;

use super::BracketError;

/// Errors that can occur during event localization.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("invalid bracket: {0}")]
    Bracket(#[from] BracketError),

    #[error("event search did not converge after {iters} iterations in [{left}, {right}]")]
    NoConvergence { iters: usize, left: f64, right: f64 },

    #[error("integration made no progress in [{left}, {right}]")]
    Stalled { left: f64, right: f64 },

    #[error("time event at {time} is still due after the event iteration")]
    StuckTimeEvent { time: f64 },

    #[error("unit call failed")]
    Unit(#[source] Box<dyn StdError + Send + Sync>),

    #[error("rollback failed")]
    Rollback(#[from] RollbackError),
}

impl Error {
    pub(crate) fn unit<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Unit(Box::new(err))
    }

    /// Maps this error to an ordinal status.
    #[must_use]
    pub fn status(&self) -> cosim_core::Status {
        match self {
            Self::Rollback(err) => err.status(),
            _ => cosim_core::Status::Error,
        }
    }
}
