use std::error::Error as StdError;

use cosim_core::{Status, VarType};
use thiserror::Error;

use crate::{event, snapshot::RollbackError};

/// Errors that can occur while driving a [`LookaheadScheduler`](super::LookaheadScheduler).
#[derive(Debug, Error)]
pub enum Error {
    #[error("no committed state, call `init` first")]
    NotSynced,

    #[error("variables cannot be defined after initialization")]
    AlreadyInitialized,

    #[error("time {time} is not finite")]
    InvalidTime { time: f64 },

    #[error("time {time} is outside the prediction window [{lower}, {upper}]")]
    OutsideWindow { time: f64, lower: f64, upper: f64 },

    #[error("{group} inputs expect {expected} values, got {got}")]
    InputShape {
        group: VarType,
        expected: usize,
        got: usize,
    },

    #[error("prediction made no progress past {time}")]
    Stalled { time: f64 },

    #[error("event handling failed")]
    Event(#[from] event::Error),

    #[error("rollback failed")]
    Rollback(#[from] RollbackError),

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
            Self::NotSynced
            | Self::InvalidTime { .. }
            | Self::OutsideWindow { .. }
            | Self::InputShape { .. } => Status::Discard,
            Self::Event(err) => err.status(),
            Self::Rollback(err) => err.status(),
            Self::AlreadyInitialized | Self::Stalled { .. } | Self::Unit(_) => Status::Error,
        }
    }
}
