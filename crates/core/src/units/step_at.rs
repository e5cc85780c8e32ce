use crate::{
    unit::SimulationUnit,
    value::{Value, ValueError, VarType},
};

use super::{UnitError, check_forward, check_type};

/// A discrete output that switches from `0` to `1` at time `t0`.
///
/// `x` is only updated by the event iteration, so integrating exactly to
/// `t0` leaves the pre-event value in place until
/// [`handle_events`](SimulationUnit::handle_events) runs. The unit has no
/// continuous states and no event indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct StepAt {
    time: f64,
    x: f64,
    t0: f64,
    fired: bool,
}

impl StepAt {
    /// Creates an uninitialized unit with `t0 = 1`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            x: 0.0,
            t0: 1.0,
            fired: false,
        }
    }
}

impl Default for StepAt {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationUnit for StepAt {
    type State = StepAt;
    type Error = UnitError;

    fn time(&self) -> f64 {
        self.time
    }

    fn get(&self, name: &str, var_type: VarType) -> Result<Value, UnitError> {
        let value = match name {
            "x" => self.x,
            "t0" => self.t0,
            _ => return Err(ValueError::unknown(name).into()),
        };
        check_type(name, VarType::Real, var_type)?;
        Ok(Value::Real(value))
    }

    fn set(&mut self, name: &str, value: &Value) -> Result<(), UnitError> {
        match name {
            "t0" => {
                self.t0 = value.clone().into_real(name)?;
                Ok(())
            }
            "x" => Err(ValueError::ReadOnly {
                name: name.to_owned(),
            }
            .into()),
            _ => Err(ValueError::unknown(name).into()),
        }
    }

    fn initialize(&mut self, start_time: f64) -> Result<(), UnitError> {
        self.time = start_time;
        self.fired = start_time >= self.t0;
        self.x = if self.fired { 1.0 } else { 0.0 };
        Ok(())
    }

    fn advance(&mut self, to: f64) -> Result<f64, UnitError> {
        check_forward(self.time, to)?;
        self.time = to;
        Ok(to)
    }

    fn event_indicators(&self) -> Result<Vec<f64>, UnitError> {
        Ok(Vec::new())
    }

    fn next_time_event(&self) -> Option<f64> {
        (!self.fired).then_some(self.t0)
    }

    fn handle_events(&mut self) -> Result<(), UnitError> {
        if !self.fired && self.time >= self.t0 {
            self.fired = true;
            self.x = 1.0;
        }
        Ok(())
    }

    fn save_state(&self) -> StepAt {
        self.clone()
    }

    fn restore_state(&mut self, state: &StepAt) -> Result<(), UnitError> {
        *self = state.clone();
        Ok(())
    }
}
