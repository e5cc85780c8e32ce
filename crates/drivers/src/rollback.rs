//! Rollback-capable integration of a single simulation unit.
//!
//! [`RollbackDriver::integrate`] moves the unit to any requested time. Going
//! forward it takes an implicit snapshot first and steps over every event on
//! the way. Going backward it restores the active snapshot (the pinned one,
//! or else the implicit one) and integrates forward again from there.
//!
//! ```
//! use cosim_core::{SimulationUnit, units::Zigzag};
//! use cosim_drivers::rollback::RollbackDriver;
//!
//! let mut driver = RollbackDriver::new(Zigzag::new(), 0.01).unwrap();
//! driver.initialize(0.0).unwrap();
//!
//! driver.integrate(0.8).unwrap();
//! driver.integrate(0.4).unwrap();
//! assert!((driver.unit().get_real("x").unwrap() - 0.4).abs() < 1e-9);
//! ```

mod error;

pub use error::Error;

use cosim_core::SimulationUnit;
use tracing::{debug, instrument};

use crate::{
    event::{self, Advance, EventLocalizer, EventMode},
    snapshot::{RollbackError, SnapshotStore},
};

/// Drives a unit that can be rolled back to a saved state.
pub struct RollbackDriver<U: SimulationUnit> {
    unit: U,
    store: SnapshotStore<U::State>,
    localizer: EventLocalizer,
    integrator_step: f64,
}

impl<U: SimulationUnit> RollbackDriver<U> {
    /// Creates a driver with default event settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `integrator_step` is not positive
    /// and finite.
    pub fn new(unit: U, integrator_step: f64) -> Result<Self, Error> {
        Self::with_event_config(unit, integrator_step, event::Config::default())
    }

    /// Creates a driver with custom event settings.
    ///
    /// The event mode is always [`EventMode::StepOverEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `integrator_step` is not positive
    /// and finite, or [`Error::Event`] if the event config is invalid.
    pub fn with_event_config(
        unit: U,
        integrator_step: f64,
        config: event::Config,
    ) -> Result<Self, Error> {
        if !integrator_step.is_finite() || integrator_step <= 0.0 {
            return Err(Error::InvalidConfig {
                reason: "integrator step must be positive and finite",
            });
        }
        let localizer = EventLocalizer::new(event::Config {
            mode: EventMode::StepOverEvent,
            ..config
        })?;

        Ok(Self {
            unit,
            store: SnapshotStore::new(),
            localizer,
            integrator_step,
        })
    }

    /// Initializes the unit at `start_time` and drops all snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit fails to initialize.
    pub fn initialize(&mut self, start_time: f64) -> Result<(), Error> {
        self.unit.initialize(start_time).map_err(Error::unit)?;
        self.store.invalidate();
        Ok(())
    }

    /// Integrates to `t_stop`, rolling back first if it lies in the past.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `t_stop` is not finite,
    /// [`Error::Rollback`] if `t_stop` is in the past and there is no
    /// snapshot at or before it, or any integration error.
    #[instrument(skip(self))]
    pub fn integrate(&mut self, t_stop: f64) -> Result<Advance, Error> {
        if !t_stop.is_finite() {
            return Err(Error::InvalidTime { time: t_stop });
        }
        let now = self.unit.time();

        if t_stop < now {
            let snapshot = self.store.active().ok_or(RollbackError::Missing)?;
            if t_stop < snapshot.time() {
                return Err(RollbackError::BeforeSnapshot {
                    requested: t_stop,
                    snapshot: snapshot.time(),
                }
                .into());
            }
            let restored = self.store.rollback(&mut self.unit)?;
            debug!(from = now, to = restored, "rolled back before integrating");
        } else {
            self.store.checkpoint(&self.unit);
        }

        let advance =
            self.localizer
                .integrate(&mut self.unit, &self.store, t_stop, self.integrator_step)?;
        Ok(advance)
    }

    /// Pins the current state as the rollback target.
    ///
    /// Returns the pinned time.
    pub fn save_current_state_for_rollback(&mut self) -> f64 {
        self.store.pin(&self.unit)
    }

    /// Releases the pinned state; implicit snapshots resume.
    pub fn release_rollback_state(&mut self) {
        self.store.release();
    }

    /// Returns the current unit time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.unit.time()
    }

    #[must_use]
    pub fn unit(&self) -> &U {
        &self.unit
    }

    /// Gives mutable access to the unit, e.g. to set inputs between calls.
    pub fn unit_mut(&mut self) -> &mut U {
        &mut self.unit
    }

    /// Consumes the driver and returns the unit.
    pub fn into_unit(self) -> U {
        self.unit
    }
}
