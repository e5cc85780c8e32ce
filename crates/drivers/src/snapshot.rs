//! Value-type snapshots of a simulation unit's full state.
//!
//! A [`SnapshotStore`] hands out [`Snapshot`]s tagged with the store's
//! identity and generation. Restoring checks both tags, so a snapshot from
//! another store or from before the last [`invalidate`](SnapshotStore::invalidate)
//! is rejected as a contract violation instead of silently corrupting the unit.
//!
//! The store keeps two rollback targets:
//!
//! - an *implicit* snapshot, replaced by every [`checkpoint`](SnapshotStore::checkpoint)
//!   taken before a speculative integration attempt
//! - a *pinned* snapshot, set by [`pin`](SnapshotStore::pin), which suppresses
//!   implicit checkpoints until it is released or replaced

mod error;

pub use error::RollbackError;

use std::sync::atomic::{AtomicU64, Ordering};

use cosim_core::SimulationUnit;
use tracing::debug;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a [`SnapshotStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

/// An immutable copy of a unit's state, tagged with the time it was taken.
#[derive(Debug, Clone)]
pub struct Snapshot<S> {
    time: f64,
    state: S,
    origin: StoreId,
    generation: u64,
}

impl<S> Snapshot<S> {
    /// Returns the unit time at which the snapshot was taken.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Returns the captured state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Saves and restores unit states.
#[derive(Debug)]
pub struct SnapshotStore<S> {
    id: StoreId,
    generation: u64,
    pinned: Option<Snapshot<S>>,
    implicit: Option<Snapshot<S>>,
}

impl<S> Default for SnapshotStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SnapshotStore<S> {
    /// Creates an empty store with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)),
            generation: 0,
            pinned: None,
            implicit: None,
        }
    }

    /// Returns this store's identity.
    #[must_use]
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Deep-copies the current state of `unit`.
    pub fn save<U>(&self, unit: &U) -> Snapshot<S>
    where
        U: SimulationUnit<State = S>,
    {
        Snapshot {
            time: unit.time(),
            state: unit.save_state(),
            origin: self.id,
            generation: self.generation,
        }
    }

    /// Overwrites the state of `unit` with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`RollbackError::Foreign`] or [`RollbackError::Stale`] if the
    /// snapshot was not issued by this store in its current generation, and
    /// [`RollbackError::Unit`] if the unit rejects the state.
    pub fn restore<U>(&self, unit: &mut U, snapshot: &Snapshot<S>) -> Result<(), RollbackError>
    where
        U: SimulationUnit<State = S>,
    {
        if snapshot.origin != self.id {
            return Err(RollbackError::Foreign);
        }
        if snapshot.generation != self.generation {
            return Err(RollbackError::Stale {
                snapshot: snapshot.generation,
                current: self.generation,
            });
        }
        unit.restore_state(&snapshot.state)
            .map_err(RollbackError::unit)
    }

    /// Takes the implicit snapshot unless one is pinned.
    ///
    /// Returns true if a snapshot was taken.
    pub fn checkpoint<U>(&mut self, unit: &U) -> bool
    where
        U: SimulationUnit<State = S>,
    {
        if self.pinned.is_some() {
            return false;
        }
        self.implicit = Some(self.save(unit));
        true
    }

    /// Pins the current state of `unit`, replacing any previous pin.
    ///
    /// Returns the pinned time.
    pub fn pin<U>(&mut self, unit: &U) -> f64
    where
        U: SimulationUnit<State = S>,
    {
        let snapshot = self.save(unit);
        let time = snapshot.time;
        debug!(time, "pinned rollback state");
        self.pinned = Some(snapshot);
        time
    }

    /// Releases the pinned snapshot, if any.
    pub fn release(&mut self) -> Option<Snapshot<S>> {
        self.pinned.take()
    }

    /// Returns true if a snapshot is pinned.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    /// Returns the current rollback target: the pinned snapshot if there is
    /// one, otherwise the implicit snapshot.
    #[must_use]
    pub fn active(&self) -> Option<&Snapshot<S>> {
        self.pinned.as_ref().or(self.implicit.as_ref())
    }

    /// Rolls `unit` back to the active snapshot.
    ///
    /// Returns the restored time.
    ///
    /// # Errors
    ///
    /// Returns [`RollbackError::Missing`] if there is no snapshot to roll
    /// back to, or any error from [`restore`](Self::restore).
    pub fn rollback<U>(&self, unit: &mut U) -> Result<f64, RollbackError>
    where
        U: SimulationUnit<State = S>,
    {
        let snapshot = self.active().ok_or(RollbackError::Missing)?;
        self.restore(unit, snapshot)?;
        debug!(time = snapshot.time, "rolled back");
        Ok(snapshot.time)
    }

    /// Drops both rollback targets and makes every outstanding snapshot stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.pinned = None;
        self.implicit = None;
    }
}
