use cosim_core::{SimulationUnit, VarType};
use tracing::instrument;

use crate::io::{InitError, InitValues, TypedValues};

use super::{Config, Error, GridSample, GridUnit, check_time};

/// Drives a fixed-step unit and holds outputs between grid points.
///
/// After a sync at `t`, the outputs are those of the latest grid point not
/// after `t`. The unit itself already sits one step ahead, at the returned
/// time.
pub struct FixedStepDriver<U: SimulationUnit> {
    grid: GridUnit<U>,
    held: Option<GridSample>,
}

impl<U: SimulationUnit> FixedStepDriver<U> {
    pub fn new(unit: U) -> Self {
        Self {
            grid: GridUnit::new(unit),
            held: None,
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
        self.held = Some(self.grid.init(instance_name, values, config)?);
        Ok(())
    }

    /// Steps the unit past `t_new` and returns the next grid point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `t_new` is not finite,
    /// [`Error::NotSynced`] before [`init`](Self::init),
    /// [`Error::BeforeGrid`] if `t_new` precedes the held grid point, or
    /// [`Error::Unit`] if a step fails.
    #[instrument(skip(self))]
    pub fn sync(&mut self, t_old: f64, t_new: f64) -> Result<f64, Error> {
        check_time(t_new)?;
        let resolution = self.grid.config.time_diff_resolution;
        let held = self.held.as_mut().ok_or(Error::NotSynced)?;
        if t_new < held.time - resolution {
            return Err(Error::BeforeGrid {
                time: t_new,
                grid: held.time,
            });
        }

        while t_new >= self.grid.grid_time(self.grid.index) - resolution {
            *held = self.grid.sample().map_err(Error::unit)?;
            self.grid.step()?;
        }
        Ok(self.grid.grid_time(self.grid.index))
    }

    /// Syncs, then writes `inputs` to the unit for the following steps.
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
    ) -> Result<f64, Error> {
        self.grid.check_inputs(inputs)?;
        let next = self.sync(t_old, t_new)?;
        self.grid.write_inputs(inputs)?;
        Ok(next)
    }

    /// Returns the held outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn outputs(&self) -> Result<&TypedValues, Error> {
        self.held
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

    /// Time of the held grid point.
    #[must_use]
    pub fn held_time(&self) -> Option<f64> {
        self.held.as_ref().map(GridSample::time)
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
