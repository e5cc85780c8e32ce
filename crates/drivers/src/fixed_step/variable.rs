use cosim_core::{SimulationUnit, VarType};
use tracing::{debug, instrument, warn};

use crate::io::{InitError, InitValues, TypedValues};

use super::{Config, Error, GridSample, GridUnit, check_time};

/// Drives a unit that accepts communication steps of any size.
///
/// Every [`sync`](Self::sync) is a single step from the current
/// communication point to `t_new`. The returned next sync time is only a
/// suggestion, `t_new + config.step`.
pub struct VariableStepDriver<U: SimulationUnit> {
    grid: GridUnit<U>,
    current: Option<GridSample>,
}

impl<U: SimulationUnit> VariableStepDriver<U> {
    pub fn new(unit: U) -> Self {
        Self {
            grid: GridUnit::new(unit),
            current: None,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_inputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.grid.define_inputs(group, names)
    }

    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] after [`init`](Self::init).
    pub fn define_outputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.grid.define_outputs(group, names)
    }

    /// Writes start values and initializes the unit at `config.start_time`.
    ///
    /// # Errors
    ///
    /// Returns an [`InitError`] if the config is invalid, any variable group
    /// fails validation, or the unit fails to initialize.
    pub fn init(
        &mut self,
        instance_name: &str,
        values: &InitValues,
        config: &Config,
    ) -> Result<(), InitError> {
        self.current = Some(self.grid.init(instance_name, values, config)?);
        Ok(())
    }

    /// Steps from `t_old` to `t_new` and returns the suggested next sync time.
    ///
    /// The call is refused with a [`Warning`](cosim_core::Status::Warning)
    /// status, leaving the unit untouched, when `t_old` is after `t_new` or
    /// is not the current communication point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if either time is not finite,
    /// [`Error::NotSynced`] before [`init`](Self::init), [`Error::Reversed`],
    /// [`Error::OffCommunicationPoint`], or [`Error::Unit`] if the step fails.
    #[instrument(skip(self))]
    pub fn sync(&mut self, t_old: f64, t_new: f64) -> Result<f64, Error> {
        check_time(t_old)?;
        check_time(t_new)?;
        let resolution = self.grid.config.time_diff_resolution;
        let current = self.current.as_mut().ok_or(Error::NotSynced)?;

        if t_old > t_new {
            warn!("t_old is after t_new");
            return Err(Error::Reversed { t_old, t_new });
        }
        if (t_old - current.time).abs() > resolution {
            warn!(current = current.time, "t_old is off the communication point");
            return Err(Error::OffCommunicationPoint {
                time: t_old,
                current: current.time,
            });
        }

        let reached = self.grid.advance_to(t_new)?;
        *current = self.grid.sample_at(reached).map_err(Error::unit)?;
        Ok(reached + self.grid.config.step)
    }

    /// Syncs, then writes `inputs` to the unit for the following step.
    ///
    /// With `iterate_once`, a zero-length step right after the write lets
    /// the outputs at `t_new` reflect the new inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputShape`] if `inputs` does not match the
    /// registered inputs, or any error from [`sync`](Self::sync).
    pub fn sync_with_inputs(
        &mut self,
        t_old: f64,
        t_new: f64,
        inputs: &TypedValues,
        iterate_once: bool,
    ) -> Result<f64, Error> {
        self.grid.check_inputs(inputs)?;
        let next = self.sync(t_old, t_new)?;
        self.grid.write_inputs(inputs)?;
        if iterate_once {
            self.iterate_once()?;
        }
        Ok(next)
    }

    /// Takes a zero-length step at the current communication point and
    /// reads the outputs again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init), or
    /// [`Error::Unit`] if the step fails.
    pub fn iterate_once(&mut self) -> Result<(), Error> {
        let current = self.current.as_mut().ok_or(Error::NotSynced)?;
        let reached = self.grid.advance_to(current.time)?;
        *current = self.grid.sample_at(reached).map_err(Error::unit)?;
        debug!(time = reached, "iterated once");
        Ok(())
    }

    /// Returns the outputs at the current communication point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn outputs(&self) -> Result<&TypedValues, Error> {
        self.current
            .as_ref()
            .map(GridSample::outputs)
            .ok_or(Error::NotSynced)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_real_outputs(&self) -> Result<&[f64], Error> {
        Ok(&self.outputs()?.real)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_integer_outputs(&self) -> Result<&[i32], Error> {
        Ok(&self.outputs()?.integer)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_boolean_outputs(&self) -> Result<&[bool], Error> {
        Ok(&self.outputs()?.boolean)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn get_string_outputs(&self) -> Result<&[String], Error> {
        Ok(&self.outputs()?.string)
    }

    #[must_use]
    pub fn communication_point(&self) -> Option<f64> {
        self.current.as_ref().map(GridSample::time)
    }

    #[must_use]
    pub fn instance_name(&self) -> &str {
        &self.grid.instance_name
    }

    #[must_use]
    pub fn unit(&self) -> &U {
        &self.grid.unit
    }
}
