use crate::{
    unit::SimulationUnit,
    value::{Value, ValueError, VarType},
};

use super::{UnitError, check_forward, check_type};

/// Relative tolerance when checking a fixed step request.
const STEP_TOL: f64 = 1e-9;

/// A sine source `x = sin(omega * t)`.
///
/// Built with [`Sine::with_fixed_step`], the unit refuses any advance that
/// is not exactly one native step.
#[derive(Debug, Clone, PartialEq)]
pub struct Sine {
    time: f64,
    x: f64,
    omega: f64,
    step: Option<f64>,
}

impl Sine {
    /// Creates an uninitialized unit with `omega = 1` and free step sizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            x: 0.0,
            omega: 1.0,
            step: None,
        }
    }

    /// Creates a unit that only advances in steps of `step`.
    #[must_use]
    pub fn with_fixed_step(step: f64) -> Self {
        Self {
            step: Some(step),
            ..Self::new()
        }
    }
}

impl Default for Sine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationUnit for Sine {
    type State = Sine;
    type Error = UnitError;

    fn time(&self) -> f64 {
        self.time
    }

    fn get(&self, name: &str, var_type: VarType) -> Result<Value, UnitError> {
        let value = match name {
            "x" => self.x,
            "omega" => self.omega,
            _ => return Err(ValueError::unknown(name).into()),
        };
        check_type(name, VarType::Real, var_type)?;
        Ok(Value::Real(value))
    }

    fn set(&mut self, name: &str, value: &Value) -> Result<(), UnitError> {
        match name {
            "omega" => {
                self.omega = value.clone().into_real(name)?;
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
        self.x = (self.omega * start_time).sin();
        Ok(())
    }

    fn advance(&mut self, to: f64) -> Result<f64, UnitError> {
        check_forward(self.time, to)?;
        if let Some(step) = self.step {
            let requested = to - self.time;
            if (requested - step).abs() > STEP_TOL * step.abs().max(1.0) {
                return Err(UnitError::StepMismatch { step, requested });
            }
        }
        self.time = to;
        self.x = (self.omega * to).sin();
        Ok(to)
    }

    fn event_indicators(&self) -> Result<Vec<f64>, UnitError> {
        Ok(Vec::new())
    }

    fn handle_events(&mut self) -> Result<(), UnitError> {
        Ok(())
    }

    fn save_state(&self) -> Sine {
        self.clone()
    }

    fn restore_state(&mut self, state: &Sine) -> Result<(), UnitError> {
        *self = state.clone();
        Ok(())
    }
}
