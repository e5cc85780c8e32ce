//! Event localization for simulation units.
//!
//! # Algorithm
//!
//! [`EventLocalizer::integrate`] advances a unit in sub-steps, sampling the
//! sign of every event indicator after each one. When a sign pattern
//! changes, the sub-step `[t_a, t_b]` brackets a state event and bisection
//! narrows it down: each trial restores the snapshot taken at the left end
//! of the bracket, integrates to the midpoint and compares signs again,
//! until the bracket is narrower than [`Config::precision`].
//!
//! Simultaneous sign changes of several indicators within one trial are a
//! single combined event at the located time.
//!
//! Time events need no search. A stretch of integration never runs past
//! the unit's [`next_time_event`](cosim_core::SimulationUnit::next_time_event),
//! so the unit lands exactly on the scheduled instant.
//!
//! # Modes
//!
//! - [`EventMode::StopBeforeEvent`]: return at the event time without running
//!   the unit's event iteration. The unit holds its left-limit values.
//! - [`EventMode::StepOverEvent`]: run the event iteration at the event time
//!   and keep integrating to the requested end.
//!
//! # Observer Events
//!
//! [`localize`] emits one [`Event`] per bisection trial. Observers can
//! return [`Action::StopEarly`] to end the search with the current bracket.

mod action;
mod bisection;
mod bracket;
mod config;
mod error;
mod iteration;
mod localizer;
mod record;
mod solution;

pub use action::Action;
pub use bracket::{Bracket, BracketError, Sign};
pub use config::{Config, EventMode};
pub use error::Error;
pub use iteration::Event;
pub use localizer::{Advance, EventLocalizer};
pub use record::{EventKind, EventRecord};
pub use solution::{Solution, Status};

use cosim_core::{Observer, SimulationUnit};

use crate::snapshot::{Snapshot, SnapshotStore};

/// Locates a state event between `left` and `right` by bisection.
///
/// `left` must be a snapshot from `store`, and the unit's indicator signs at
/// `right` must differ from those at `left`. On return the unit sits at
/// [`Solution::time`], the right end of the final bracket, with the event
/// not yet handled.
///
/// # Errors
///
/// Returns an error if the config or bracket is invalid, a trial cannot
/// make progress, the unit fails, or `left` cannot be restored.
pub fn localize<U, Obs>(
    unit: &mut U,
    store: &SnapshotStore<U::State>,
    left: &Snapshot<U::State>,
    right: f64,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    U: SimulationUnit,
    Obs: Observer<Event, Action>,
{
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;
    bisection::bisect(unit, store, left, right, config, observer)
}

/// Locates a state event without observer support.
///
/// This is a convenience wrapper around [`localize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns the same errors as [`localize`].
pub fn localize_unobserved<U>(
    unit: &mut U,
    store: &SnapshotStore<U::State>,
    left: &Snapshot<U::State>,
    right: f64,
    config: &Config,
) -> Result<Solution, Error>
where
    U: SimulationUnit,
{
    localize(unit, store, left, right, config, ())
}
