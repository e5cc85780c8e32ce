//! Look-ahead scheduling of a simulation unit.
//!
//! # Algorithm
//!
//! A [`LookaheadScheduler`] integrates its unit speculatively past the
//! caller's committed time and buffers the outputs in a [`PredictionWindow`]
//! sampled every `lookahead_step`, out to `committed + horizon`. A `sync`
//! that lands strictly inside the window is answered from the buffer; one
//! that reaches the window's upper bound commits the boundary sample and
//! starts the next prediction from it.
//!
//! The window is rebuilt wholesale when inputs changed since it was built or
//! when `t_old` does not match the committed time (such as [`UNSET_TIME`]
//! right after [`init`](LookaheadScheduler::init)).
//!
//! # Events
//!
//! A prediction stops at the first state or time event and the window is
//! truncated there. Crossing the event takes two calls:
//!
//! 1. A `sync` landing on the event time commits the left-limit values,
//!    raises the [event flag](LookaheadScheduler::event_flag) and returns
//!    the event time again ("step to event").
//! 2. `sync(t_e, t_e)` runs the unit's event iteration, clears the flag and
//!    predicts from the post-event state ("step over event").
//!
//! [`update_state_from_the_right`](LookaheadScheduler::update_state_from_the_right)
//! does both at once and commits the right-limit values.
//!
//! # Late syncs
//!
//! A `sync` past the returned deadline is not rejected. The scheduler
//! commits the deadline, steps over any event there, and predicts again
//! until the window covers the request, logging a warning.

mod config;
mod error;
mod window;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use error::Error;
pub use window::{PredictionWindow, Sample};

use cosim_core::{SimulationUnit, Value, VarType};
use tracing::{debug, info, instrument, warn};

use crate::{
    event::{self, EventLocalizer, EventMode, EventRecord},
    io::{self, InitError, InitValues, TypedValues, VarSet},
    snapshot::SnapshotStore,
};

use window::Position;

/// Sentinel for `t_old` meaning "no prior commitment".
pub const UNSET_TIME: f64 = f64::NEG_INFINITY;

fn check_time(time: f64) -> Result<(), Error> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidTime { time })
    }
}

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,

    /// A prediction was made but not committed through `sync`.
    Predicting,

    Synchronized,
}

/// Predicts a unit ahead of its caller and corrects the prediction on demand.
///
/// Between calls the unit always holds the committed state, so typed
/// passthrough reads such as [`get_real`](Self::get_real) see the values at
/// the committed time.
pub struct LookaheadScheduler<U: SimulationUnit> {
    unit: U,
    store: SnapshotStore<U::State>,
    localizer: EventLocalizer,
    config: Config,
    inputs: VarSet,
    outputs: VarSet,
    instance_name: String,
    phase: Phase,
    committed: Option<Sample<U::State>>,
    window: Option<PredictionWindow<U::State>>,
    pending: Option<EventRecord>,
    last_event: Option<EventRecord>,
    input_values: TypedValues,
}

impl<U: SimulationUnit> LookaheadScheduler<U> {
    /// Wraps an uninitialized unit.
    pub fn new(unit: U) -> Self {
        Self {
            unit,
            store: SnapshotStore::new(),
            localizer: EventLocalizer::default(),
            config: Config::default(),
            inputs: VarSet::new(),
            outputs: VarSet::new(),
            instance_name: String::new(),
            phase: Phase::Uninitialized,
            committed: None,
            window: None,
            pending: None,
            last_event: None,
            input_values: TypedValues::default(),
        }
    }

    /// Registers the `group` inputs, replacing earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_inputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if self.phase != Phase::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        self.inputs.define(group, names);
        Ok(())
    }

    /// Registers the `group` outputs, replacing earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_outputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if self.phase != Phase::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        self.outputs.define(group, names);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_real_inputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_inputs(VarType::Real, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_integer_inputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_inputs(VarType::Integer, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_boolean_inputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_inputs(VarType::Boolean, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_string_inputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_inputs(VarType::String, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_real_outputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_outputs(VarType::Real, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_integer_outputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_outputs(VarType::Integer, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_boolean_outputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_outputs(VarType::Boolean, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_string_outputs<I, N>(&mut self, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.define_outputs(VarType::String, names)
    }

    /// Writes start values, initializes the unit at `start_time` and commits
    /// the initial outputs.
    ///
    /// Every variable group is validated, even after another group failed,
    /// and all failures are reported together.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Variables`] listing the first failure of each
    /// failing group, or another [`InitError`] if the config is invalid, the
    /// scheduler was already initialized, or the unit fails to initialize.
    #[instrument(skip(self, values))]
    pub fn init(
        &mut self,
        instance_name: &str,
        values: &InitValues,
        start_time: f64,
        config: &Config,
    ) -> Result<(), InitError> {
        if self.phase != Phase::Uninitialized {
            return Err(InitError::AlreadyInitialized);
        }
        config
            .validate()
            .map_err(|reason| InitError::InvalidConfig { reason })?;
        let localizer = EventLocalizer::new(event::Config {
            mode: EventMode::StopBeforeEvent,
            ..config.event
        })
        .map_err(|_| InitError::InvalidConfig {
            reason: "invalid event config",
        })?;

        let failures = io::validate(&mut self.unit, values, &[&self.inputs, &self.outputs]);
        if !failures.is_empty() {
            warn!(count = failures.len(), "variable validation failed");
            return Err(InitError::Variables { failures });
        }

        self.unit
            .initialize(start_time)
            .map_err(InitError::unit)?;
        self.store.invalidate();

        let outputs = TypedValues::read(&self.unit, &self.outputs).map_err(InitError::unit)?;
        let input_values = TypedValues::read(&self.unit, &self.inputs).map_err(InitError::unit)?;
        let sample = Sample::new(self.unit.time(), outputs, self.store.save(&self.unit));

        self.window = Some(PredictionWindow::new(sample.clone(), input_values.clone()));
        self.committed = Some(sample);
        self.input_values = input_values;
        self.config = *config;
        self.localizer = localizer;
        self.instance_name = instance_name.to_owned();
        self.pending = None;
        self.last_event = None;
        self.phase = Phase::Initialized;

        info!(start_time, "initialized");
        Ok(())
    }

    /// Commits `t_new` and returns the next mandatory sync time.
    ///
    /// Answers from the live prediction window when `t_old` is the committed
    /// time, inputs are unchanged and `t_new` lies strictly before the
    /// window's upper bound. Otherwise commits `t_new` and predicts again
    /// from it. Landing exactly on the upper bound always re-predicts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `t_new` is not finite,
    /// [`Error::NotSynced`] before [`init`](Self::init),
    /// [`Error::OutsideWindow`] if `t_new` precedes the live window, or any
    /// error from integration, event search or rollback.
    #[instrument(skip(self))]
    pub fn sync(&mut self, t_old: f64, t_new: f64) -> Result<f64, Error> {
        check_time(t_new)?;
        let committed = self.committed_time().ok_or(Error::NotSynced)?;
        let window = self.window.as_ref().ok_or(Error::NotSynced)?;
        let upper = window.upper_bound();
        let fresh = !self.same_time(t_old, committed);
        let inputs_changed = window.inputs != self.input_values;
        debug!(committed, upper, fresh, inputs_changed, "sync");

        if !fresh
            && !inputs_changed
            && self.pending.is_none()
            && t_new < upper - self.config.time_diff_resolution
        {
            self.commit(t_new)?;
            self.phase = Phase::Synchronized;
            return Ok(upper);
        }

        self.catch_up(t_new)?;
        self.commit(t_new)?;
        let next = self.predict()?;
        self.phase = Phase::Synchronized;
        Ok(next)
    }

    /// Sets new input values, then syncs.
    ///
    /// The state at `t_new` is committed with the previous inputs; the new
    /// ones take effect from `t_new` onward.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputShape`] if `inputs` does not match the
    /// registered inputs, or any error from [`sync`](Self::sync).
    #[instrument(skip(self, inputs))]
    pub fn sync_with_inputs(
        &mut self,
        t_old: f64,
        t_new: f64,
        inputs: &TypedValues,
    ) -> Result<f64, Error> {
        self.set_inputs(inputs)?;
        self.sync(t_old, t_new)
    }

    /// Replaces the input values used by the next prediction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputShape`] if `inputs` does not match the
    /// registered inputs.
    pub fn set_inputs(&mut self, inputs: &TypedValues) -> Result<(), Error> {
        if let Some((group, expected, got)) = inputs.shape_mismatch(&self.inputs) {
            return Err(Error::InputShape {
                group,
                expected,
                got,
            });
        }
        self.input_values.clone_from(inputs);
        Ok(())
    }

    /// Commits `t_new` if needed and predicts from it without syncing.
    ///
    /// Unlike [`sync`](Self::sync), the live window is always rebuilt, so
    /// `t_old` only shows up in the trace span. Returns the provisional next
    /// sync time.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`sync`](Self::sync).
    #[instrument(skip(self))]
    pub fn predict_state(&mut self, t_old: f64, t_new: f64) -> Result<f64, Error> {
        check_time(t_new)?;
        let committed = self.committed_time().ok_or(Error::NotSynced)?;
        debug!(committed, "predict state");

        if !self.same_time(t_new, committed) {
            self.catch_up(t_new)?;
            self.commit(t_new)?;
        }
        let next = self.predict()?;
        self.phase = Phase::Predicting;
        Ok(next)
    }

    /// Commits the state at `t` from the live window.
    ///
    /// Returns the committed time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `t` is not finite, or
    /// [`Error::OutsideWindow`] if the window does not cover `t`.
    pub fn update_state(&mut self, t: f64) -> Result<f64, Error> {
        check_time(t)?;
        self.commit(t)?;
        self.phase = Phase::Synchronized;
        self.committed_time().ok_or(Error::NotSynced)
    }

    /// Commits the right-limit state at an event time `t`.
    ///
    /// If the window was truncated by an event at `t`, steps to and over the
    /// event, then integrates by `time_diff_resolution` so the committed
    /// outputs are the post-event values. Otherwise behaves like
    /// [`update_state`](Self::update_state).
    ///
    /// Returns the committed time. After an event this is
    /// `t + time_diff_resolution`, not `t`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`update_state`](Self::update_state).
    #[instrument(skip(self))]
    pub fn update_state_from_the_right(&mut self, t: f64) -> Result<f64, Error> {
        check_time(t)?;
        let at_event = self
            .window
            .as_ref()
            .and_then(PredictionWindow::event)
            .is_some_and(|event| self.same_time(event.time, t));
        if !at_event {
            return self.update_state(t);
        }

        if self.pending.is_none() {
            self.commit(t)?;
        }
        if self.pending.is_some() {
            self.commit(t)?;
        }

        let committed = self.committed.as_mut().ok_or(Error::NotSynced)?;
        let right = committed.time + self.config.time_diff_resolution;
        self.unit.advance(right).map_err(Error::unit)?;

        let outputs = TypedValues::read(&self.unit, &self.outputs).map_err(Error::unit)?;
        *committed = Sample::new(self.unit.time(), outputs, self.store.save(&self.unit));
        self.window = Some(PredictionWindow::new(
            committed.clone(),
            self.input_values.clone(),
        ));
        self.phase = Phase::Synchronized;

        debug!(time = committed.time, "committed right limit");
        Ok(committed.time)
    }

    /// Returns the committed real outputs in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_real_outputs(&self) -> Result<&[f64], Error> {
        Ok(&self.outputs()?.real)
    }

    /// Returns the committed integer outputs in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_integer_outputs(&self) -> Result<&[i32], Error> {
        Ok(&self.outputs()?.integer)
    }

    /// Returns the committed boolean outputs in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_boolean_outputs(&self) -> Result<&[bool], Error> {
        Ok(&self.outputs()?.boolean)
    }

    /// Returns the committed string outputs in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_string_outputs(&self) -> Result<&[String], Error> {
        Ok(&self.outputs()?.string)
    }

    /// Returns all committed outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn outputs(&self) -> Result<&TypedValues, Error> {
        self.committed
            .as_ref()
            .map(Sample::outputs)
            .ok_or(Error::NotSynced)
    }

    /// Reads any variable at the committed time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the read.
    pub fn get_value(&self, name: &str, var_type: VarType) -> Result<Value, Error> {
        self.unit.get(name, var_type).map_err(Error::unit)
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the variable is unknown or not real.
    pub fn get_real(&self, name: &str) -> Result<f64, Error> {
        self.unit.get_real(name).map_err(Error::unit)
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the variable is unknown or not an integer.
    pub fn get_integer(&self, name: &str) -> Result<i32, Error> {
        self.unit.get_integer(name).map_err(Error::unit)
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the variable is unknown or not a boolean.
    pub fn get_boolean(&self, name: &str) -> Result<bool, Error> {
        self.unit.get_boolean(name).map_err(Error::unit)
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the variable is unknown or not a string.
    pub fn get_string(&self, name: &str) -> Result<String, Error> {
        self.unit.get_string(name).map_err(Error::unit)
    }

    /// Writes any variable at the committed time.
    ///
    /// After initialization the write becomes part of the committed state
    /// and the live window is discarded, so the next sync predicts again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the write.
    pub fn set_value(&mut self, name: &str, value: &Value) -> Result<(), Error> {
        self.unit.set(name, value).map_err(Error::unit)?;

        if let Some(committed) = self.committed.as_mut() {
            committed.snapshot = self.store.save(&self.unit);
            self.window = Some(PredictionWindow::new(
                committed.clone(),
                self.input_values.clone(),
            ));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the write.
    pub fn set_real(&mut self, name: &str, value: f64) -> Result<(), Error> {
        self.set_value(name, &Value::Real(value))
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the write.
    pub fn set_integer(&mut self, name: &str, value: i32) -> Result<(), Error> {
        self.set_value(name, &Value::Integer(value))
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the write.
    pub fn set_boolean(&mut self, name: &str, value: bool) -> Result<(), Error> {
        self.set_value(name, &Value::Boolean(value))
    }

    /// # Errors
    ///
    /// Returns [`Error::Unit`] if the unit rejects the write.
    pub fn set_string(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.set_value(name, &Value::String(value.to_owned()))
    }

    /// Returns true while an event at the committed time awaits stepping over.
    #[must_use]
    pub fn event_flag(&self) -> bool {
        self.pending.is_some()
    }

    /// Raises or clears the event flag.
    ///
    /// Clearing discards the pending event without running the unit's event
    /// iteration. Raising only takes effect when the live window ends in an
    /// event at the committed time.
    pub fn set_event_flag(&mut self, flag: bool) {
        if !flag {
            self.pending = None;
            if let Some(window) = self.window.as_mut() {
                window.event = None;
            }
            return;
        }

        let Some(committed) = self.committed_time() else {
            return;
        };
        self.pending = self
            .window
            .as_ref()
            .and_then(|window| window.event)
            .filter(|event| self.same_time(event.time, committed));
    }

    /// Returns the most recently stepped-over event.
    #[must_use]
    pub fn last_event(&self) -> Option<&EventRecord> {
        self.last_event.as_ref()
    }

    #[must_use]
    pub fn window(&self) -> Option<&PredictionWindow<U::State>> {
        self.window.as_ref()
    }

    #[must_use]
    pub fn committed_time(&self) -> Option<f64> {
        self.committed.as_ref().map(Sample::time)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the unit, which holds the committed state.
    #[must_use]
    pub fn unit(&self) -> &U {
        &self.unit
    }

    fn same_time(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.config.time_diff_resolution
    }

    /// Commits the state at `t`.
    ///
    /// Steps over the pending event if `t` is the committed time, otherwise
    /// resolves `t` in the live window.
    fn commit(&mut self, t: f64) -> Result<(), Error> {
        let resolution = self.config.time_diff_resolution;

        if let Some(event) = self.pending.take() {
            let committed = self.committed.as_mut().ok_or(Error::NotSynced)?;
            if (t - committed.time).abs() <= resolution {
                self.store.restore(&mut self.unit, &committed.snapshot)?;
                self.unit.handle_events().map_err(Error::unit)?;
                committed.snapshot = self.store.save(&self.unit);
                self.window = Some(PredictionWindow::new(
                    committed.clone(),
                    self.input_values.clone(),
                ));

                let event = event.consumed();
                debug!(time = event.time, kind = ?event.kind, "stepped over event");
                self.last_event = Some(event);
                return Ok(());
            }
        }

        let window = self.window.as_ref().ok_or(Error::NotSynced)?;
        let position = window
            .resolve(t, resolution)
            .ok_or_else(|| Error::OutsideWindow {
                time: t,
                lower: window.lower_bound(),
                upper: window.upper_bound(),
            })?;

        let sample = match position {
            Position::Exact(index) => {
                let sample = window.samples[index].clone();
                self.store.restore(&mut self.unit, &sample.snapshot)?;
                sample
            }
            Position::Between(index) => {
                self.store
                    .restore(&mut self.unit, &window.samples[index].snapshot)?;
                self.unit.advance(t).map_err(Error::unit)?;
                let outputs = TypedValues::read(&self.unit, &self.outputs).map_err(Error::unit)?;
                Sample::new(t, outputs, self.store.save(&self.unit))
            }
        };

        if position == Position::Exact(window.last_index()) {
            self.pending = window.event;
            if let Some(event) = &self.pending {
                debug!(time = event.time, kind = ?event.kind, "stepped to event");
            }
        }
        self.committed = Some(sample);
        Ok(())
    }

    /// Commits window boundaries until the window covers `t`.
    fn catch_up(&mut self, t: f64) -> Result<(), Error> {
        let resolution = self.config.time_diff_resolution;

        loop {
            let committed = self.committed_time().ok_or(Error::NotSynced)?;
            let upper = self
                .window
                .as_ref()
                .map(PredictionWindow::upper_bound)
                .ok_or(Error::NotSynced)?;
            if t <= upper + resolution {
                return Ok(());
            }
            if upper > committed + resolution {
                warn!(
                    requested = t,
                    deadline = upper,
                    "sync past the mandatory deadline, predicting again"
                );
            }

            self.commit(upper)?;
            if self.pending.is_some() {
                self.commit(upper)?;
            }
            let reached = self.predict()?;
            let at_event = self
                .window
                .as_ref()
                .is_some_and(PredictionWindow::truncated_by_event);
            if reached <= upper + resolution && !at_event {
                return Err(Error::Stalled { time: upper });
            }
        }
    }

    /// Predicts from the committed state and replaces the live window.
    ///
    /// Returns the window's upper bound. With an event pending the window is
    /// kept and the committed time is returned.
    fn predict(&mut self) -> Result<f64, Error> {
        let committed = self.committed.as_mut().ok_or(Error::NotSynced)?;
        if self.pending.is_some() {
            return Ok(committed.time);
        }

        let resolution = self.config.time_diff_resolution;
        self.store.restore(&mut self.unit, &committed.snapshot)?;
        self.input_values
            .write(&mut self.unit, &self.inputs)
            .map_err(Error::unit)?;
        committed.snapshot = self.store.save(&self.unit);
        self.store.checkpoint(&self.unit);

        let horizon_end = committed.time + self.config.horizon;
        let mut window = PredictionWindow::new(committed.clone(), self.input_values.clone());

        while horizon_end - self.unit.time() > resolution {
            let now = self.unit.time();
            let target = (now + self.config.lookahead_step).min(horizon_end);
            let advance = self.localizer.integrate(
                &mut self.unit,
                &self.store,
                target,
                self.config.integrator_step,
            )?;

            let outputs = TypedValues::read(&self.unit, &self.outputs).map_err(Error::unit)?;
            let sample = Sample::new(advance.reached, outputs, self.store.save(&self.unit));

            // An event within resolution of the last sample replaces it with
            // the crossed state.
            if advance.pending.is_some() && advance.reached <= now + resolution {
                window.replace_last(sample);
            } else {
                window.push(sample);
            }

            if let Some(event) = advance.pending {
                let repeated = self.last_event.is_some_and(|last| {
                    last.kind == event.kind && (last.time - event.time).abs() <= resolution
                });
                if repeated && event.time <= committed.time + resolution {
                    self.store.restore(&mut self.unit, &committed.snapshot)?;
                    return Err(Error::Stalled { time: event.time });
                }

                debug!(time = event.time, kind = ?event.kind, "prediction truncated by event");
                window.event = Some(event);
                break;
            }
        }

        self.store.restore(&mut self.unit, &committed.snapshot)?;
        let upper = window.upper_bound();
        debug!(
            lower = window.lower_bound(),
            upper,
            samples = window.samples.len(),
            "predicted"
        );
        self.window = Some(window);
        Ok(upper)
    }
}
