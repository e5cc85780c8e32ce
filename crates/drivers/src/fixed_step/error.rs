use std::error::Error as StdError;

use cosim_core::{Status, VarType};
use thiserror::Error;

/// Errors that can occur while driving a fixed-step unit.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no grid samples yet, call `init` first")]
    NotSynced,

    #[error("variables cannot be defined after initialization")]
    AlreadyInitialized,

    #[error("time {time} is not finite")]
    InvalidTime { time: f64 },

    #[error("t_old {t_old} is after t_new {t_new}")]
    Reversed { t_old: f64, t_new: f64 },

    #[error("t_old {time} is not the current communication point {current}")]
    OffCommunicationPoint { time: f64, current: f64 },

    #[error("time {time} precedes the current grid point {grid}")]
    BeforeGrid { time: f64, grid: f64 },

    #[error("{group} inputs expect {expected} values, got {got}")]
    InputShape {
        group: VarType,
        expected: usize,
        got: usize,
    },

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
            | Self::BeforeGrid { .. }
            | Self::InputShape { .. } => Status::Discard,
            Self::Reversed { .. } | Self::OffCommunicationPoint { .. } => Status::Warning,
            Self::AlreadyInitialized | Self::Unit(_) => Status::Error,
        }
    }
}
