//! Drivers for units that are stepped forward and never rolled back.
//!
//! Two of them step the unit along the grid `start_time + k * step` and
//! differ in what they report between grid points:
//!
//! - [`FixedStepInterpolator`] keeps the two grid samples bracketing the
//!   query and interpolates real outputs linearly between them.
//! - [`FixedStepDriver`] holds the outputs of the latest grid point not
//!   after the query.
//!
//! [`VariableStepDriver`] has no grid. Each sync is a single step of
//! whatever size the caller asks for, and [`Config::step`] only sets the
//! suggested next sync time.
//!
//! In all three, `sync_with_inputs` writes the new inputs after the step,
//! so they act from the end of the synced interval onward.

mod config;
mod error;
mod holding;
mod interpolating;
mod variable;

pub use config::Config;
pub use error::Error;
pub use holding::FixedStepDriver;
pub use interpolating::FixedStepInterpolator;
pub use variable::VariableStepDriver;

use cosim_core::{SimulationUnit, VarType};
use tracing::{debug, info};

use crate::io::{self, InitError, InitValues, TypedValues, VarSet};

fn check_time(time: f64) -> Result<(), Error> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidTime { time })
    }
}

/// Outputs read at one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSample {
    time: f64,
    outputs: TypedValues,
}

impl GridSample {
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn outputs(&self) -> &TypedValues {
        &self.outputs
    }
}

/// A unit with its registered variables, shared by all drivers here.
struct GridUnit<U> {
    unit: U,
    config: Config,
    inputs: VarSet,
    outputs: VarSet,
    instance_name: String,
    initialized: bool,

    /// Grid index of the unit's current time.
    index: u64,
}

impl<U: SimulationUnit> GridUnit<U> {
    fn new(unit: U) -> Self {
        Self {
            unit,
            config: Config::default(),
            inputs: VarSet::new(),
            outputs: VarSet::new(),
            instance_name: String::new(),
            initialized: false,
            index: 0,
        }
    }

    fn define_inputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.inputs.define(group, names);
        Ok(())
    }

    fn define_outputs<I, N>(&mut self, group: VarType, names: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        if self.initialized {
            return Err(Error::AlreadyInitialized);
        }
        self.outputs.define(group, names);
        Ok(())
    }

    /// Validates, initializes and returns the sample at `start_time`.
    fn init(
        &mut self,
        instance_name: &str,
        values: &InitValues,
        config: &Config,
    ) -> Result<GridSample, InitError> {
        if self.initialized {
            return Err(InitError::AlreadyInitialized);
        }
        config
            .validate()
            .map_err(|reason| InitError::InvalidConfig { reason })?;

        let failures = io::validate(&mut self.unit, values, &[&self.inputs, &self.outputs]);
        if !failures.is_empty() {
            return Err(InitError::Variables { failures });
        }
        self.unit
            .initialize(config.start_time)
            .map_err(InitError::unit)?;

        self.config = *config;
        self.instance_name = instance_name.to_owned();
        self.index = 0;
        self.initialized = true;
        info!(
            start_time = config.start_time,
            step = config.step,
            "initialized"
        );

        self.sample().map_err(InitError::unit)
    }

    fn grid_time(&self, index: u64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let k = index as f64;
        self.config.start_time + k * self.config.step
    }

    /// Advances the unit by one native step.
    fn step(&mut self) -> Result<f64, Error> {
        let target = self.grid_time(self.index + 1);
        let reached = self.unit.advance(target).map_err(Error::unit)?;
        self.index += 1;
        debug!(time = reached, index = self.index, "grid step");
        Ok(reached)
    }

    /// Advances the unit to `to` in one step of any size.
    fn advance_to(&mut self, to: f64) -> Result<f64, Error> {
        let reached = self.unit.advance(to).map_err(Error::unit)?;
        debug!(time = reached, "variable step");
        Ok(reached)
    }

    fn sample(&self) -> Result<GridSample, U::Error> {
        self.sample_at(self.grid_time(self.index))
    }

    fn sample_at(&self, time: f64) -> Result<GridSample, U::Error> {
        Ok(GridSample {
            time,
            outputs: TypedValues::read(&self.unit, &self.outputs)?,
        })
    }

    fn check_inputs(&self, inputs: &TypedValues) -> Result<(), Error> {
        match inputs.shape_mismatch(&self.inputs) {
            Some((group, expected, got)) => Err(Error::InputShape {
                group,
                expected,
                got,
            }),
            None => Ok(()),
        }
    }

    fn write_inputs(&mut self, inputs: &TypedValues) -> Result<(), Error> {
        inputs
            .write(&mut self.unit, &self.inputs)
            .map_err(Error::unit)
    }
}
