use std::error::Error as StdError;

use cosim_core::Status;
use thiserror::Error;

use crate::{event, snapshot::RollbackError};

/// Errors that can occur in a [`RollbackDriver`](super::RollbackDriver).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("time {time} is not finite")]
    InvalidTime { time: f64 },

    #[error("rollback failed")]
    Rollback(#[from] RollbackError),

    #[error("event handling failed")]
    Event(#[from] event::Error),

    #[error("unit call failed")]
    Unit(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn unit<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Unit(Box::new(err))
    }

    /// Maps this error to an ordinal status.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Rollback(err) => err.status(),
            Self::Event(err) => err.status(),
            Self::InvalidTime { .. } => Status::Discard,
            Self::InvalidConfig { .. } | Self::Unit(_) => Status::Error,
        }
    }
}
