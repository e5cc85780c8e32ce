use cosim_core::{SimulationUnit, VarType};
use tracing::{debug, instrument};

use crate::io::{InitError, InitValues, TypedValues};

use super::{Config, Error, GridSample, GridUnit, check_time};

#[derive(Debug, Clone)]
struct Bracket {
    previous: GridSample,
    next: GridSample,
}

/// Interpolates the outputs of a fixed-step unit between grid points.
///
/// Real outputs at a query time `t` in `[t_k, t_k+1]` are
/// `y_k + (t - t_k) * (y_k+1 - y_k) / (t_k+1 - t_k)`. Integer, boolean and
/// string outputs are taken from `t_k`.
pub struct FixedStepInterpolator<U: SimulationUnit> {
    grid: GridUnit<U>,
    bracket: Option<Bracket>,
    current: Option<TypedValues>,
}

impl<U: SimulationUnit> FixedStepInterpolator<U> {
    pub fn new(unit: U) -> Self {
        Self {
            grid: GridUnit::new(unit),
            bracket: None,
            current: None,
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
        self.grid.define_inputs(group, names)
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
        self.grid.define_outputs(group, names)
    }

    /// Writes start values and initializes the unit at `config.start_time`.
    ///
    /// Until the first [`sync`](Self::sync) the outputs are the initial
    /// values.
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
        let start = self.grid.init(instance_name, values, config)?;
        self.current = Some(start.outputs.clone());
        self.bracket = Some(Bracket {
            previous: start.clone(),
            next: start,
        });
        Ok(())
    }

    /// Interpolates the outputs at `t_new` and returns the next grid point.
    ///
    /// Steps the unit along the grid until `t_new` lies before the next grid
    /// point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `t_new` is not finite,
    /// [`Error::NotSynced`] before [`init`](Self::init),
    /// [`Error::BeforeGrid`] if `t_new` precedes the left grid sample, or
    /// [`Error::Unit`] if a step fails.
    #[instrument(skip(self))]
    pub fn sync(&mut self, t_old: f64, t_new: f64) -> Result<f64, Error> {
        check_time(t_new)?;
        let resolution = self.grid.config.time_diff_resolution;
        let Some(bracket) = self.bracket.as_mut() else {
            return Err(Error::NotSynced);
        };
        if t_new < bracket.previous.time - resolution {
            return Err(Error::BeforeGrid {
                time: t_new,
                grid: bracket.previous.time,
            });
        }

        while t_new >= bracket.next.time - resolution {
            self.grid.step()?;
            let sample = self.grid.sample().map_err(Error::unit)?;
            bracket.previous = std::mem::replace(&mut bracket.next, sample);
        }

        let Bracket { previous, next } = bracket;
        let span = next.time - previous.time;
        let theta = (t_new - previous.time) / span;
        self.current = Some(previous.outputs.lerp(&next.outputs, theta));

        debug!(previous = previous.time, next = next.time, theta, "interpolated");
        Ok(next.time)
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

    /// Returns the interpolated outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSynced`] before [`init`](Self::init).
    pub fn outputs(&self) -> Result<&TypedValues, Error> {
        self.current.as_ref().ok_or(Error::NotSynced)
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

    /// Returns the grid samples bracketing the last query.
    #[must_use]
    pub fn bracket(&self) -> Option<(&GridSample, &GridSample)> {
        self.bracket.as_ref().map(|b| (&b.previous, &b.next))
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
