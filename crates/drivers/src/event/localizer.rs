use cosim_core::SimulationUnit;
use tracing::debug;

use crate::snapshot::SnapshotStore;

use super::{
    Config, Error, EventKind, EventMode, EventRecord, Status, bisection::bisect, bracket::signs,
};

/// Outcome of [`EventLocalizer::integrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    /// Time the unit reached.
    pub reached: f64,

    /// Events handled on the way, in time order.
    pub handled: Vec<EventRecord>,

    /// The event integration stopped at, if any.
    ///
    /// Only set in [`EventMode::StopBeforeEvent`], in which case `reached`
    /// is the event time and the unit holds its left-limit values.
    pub pending: Option<EventRecord>,
}

/// Integrates a unit while detecting and locating events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventLocalizer {
    config: Config,
}

impl Default for EventLocalizer {
    fn default() -> Self {
        Self {
            config: Config::default(),
        }
    }
}

impl EventLocalizer {
    /// Creates a localizer with a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the config is invalid.
    pub fn new(config: Config) -> Result<Self, Error> {
        config
            .validate()
            .map_err(|reason| Error::InvalidConfig { reason })?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Integrates `unit` to `to` in sub-steps of at most `step`.
    ///
    /// Sub-step snapshots are taken from `store`, so it must be the store
    /// that owns the unit's other snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` is not positive, an event search fails to
    /// converge, a handled time event stays due, or the unit fails.
    pub fn integrate<U: SimulationUnit>(
        &self,
        unit: &mut U,
        store: &SnapshotStore<U::State>,
        to: f64,
        step: f64,
    ) -> Result<Advance, Error> {
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::InvalidConfig {
                reason: "integrator step must be positive and finite",
            });
        }

        let mut handled = Vec::new();

        loop {
            let now = unit.time();

            if unit.next_time_event().is_some_and(|te| te <= now) {
                let record = EventRecord::new(now, EventKind::Time);
                debug!(time = now, "time event reached");

                match self.config.mode {
                    EventMode::StopBeforeEvent => {
                        return Ok(Advance {
                            reached: now,
                            handled,
                            pending: Some(record),
                        });
                    }
                    EventMode::StepOverEvent => {
                        unit.handle_events().map_err(Error::unit)?;
                        if unit.next_time_event().is_some_and(|te| te <= now) {
                            return Err(Error::StuckTimeEvent { time: now });
                        }
                        handled.push(record.consumed());
                    }
                }
            }

            if now >= to {
                return Ok(Advance {
                    reached: now,
                    handled,
                    pending: None,
                });
            }

            let end = unit.next_time_event().map_or(to, |te| te.min(to));
            let Some(record) = self.integrate_stretch(unit, store, end, step)? else {
                continue;
            };

            match self.config.mode {
                EventMode::StopBeforeEvent => {
                    return Ok(Advance {
                        reached: unit.time(),
                        handled,
                        pending: Some(record),
                    });
                }
                EventMode::StepOverEvent => {
                    unit.handle_events().map_err(Error::unit)?;
                    handled.push(record.consumed());
                }
            }
        }
    }

    /// Integrates to `end` and stops at the first state event.
    fn integrate_stretch<U: SimulationUnit>(
        &self,
        unit: &mut U,
        store: &SnapshotStore<U::State>,
        end: f64,
        step: f64,
    ) -> Result<Option<EventRecord>, Error> {
        let mut left_signs = signs(&unit.event_indicators().map_err(Error::unit)?);

        while unit.time() < end {
            let anchor = store.save(unit);
            let from = unit.time();
            let target = (from + step).min(end);

            let reached = unit.advance(target).map_err(Error::unit)?;
            if reached <= from {
                return Err(Error::Stalled {
                    left: from,
                    right: target,
                });
            }

            let right_signs = signs(&unit.event_indicators().map_err(Error::unit)?);
            if right_signs == left_signs {
                continue;
            }

            let solution = bisect(unit, store, &anchor, reached, &self.config, ())?;
            if solution.status != Status::Converged {
                return Err(Error::NoConvergence {
                    iters: solution.iters,
                    left: solution.bracket.left,
                    right: solution.bracket.right,
                });
            }

            debug!(
                time = solution.time,
                iters = solution.iters,
                "state event located"
            );
            return Ok(Some(EventRecord::new(solution.time, EventKind::State)));
        }

        Ok(None)
    }
}
