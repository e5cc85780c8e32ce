use std::error::Error as StdError;

use cosim_core::Status;
use thiserror::Error;

/// Errors that can occur when restoring a snapshot.
///
/// These are contract violations and are never retried.
#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("snapshot was issued by another store")]
    Foreign,

    #[error("snapshot from generation {snapshot} is stale, store is at generation {current}")]
    Stale { snapshot: u64, current: u64 },

    #[error("no snapshot to roll back to")]
    Missing,

    #[error("cannot roll back to {requested}, earliest available state is at {snapshot}")]
    BeforeSnapshot { requested: f64, snapshot: f64 },

    #[error("unit rejected the saved state")]
    Unit(#[source] Box<dyn StdError + Send + Sync>),
}

impl RollbackError {
    pub(crate) fn unit<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Unit(Box::new(err))
    }

    /// Maps this error to an ordinal status.
    #[must_use]
    pub fn status(&self) -> Status {
        Status::Fatal
    }
}
