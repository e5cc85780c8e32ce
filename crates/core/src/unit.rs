use crate::value::{Value, ValueError, VarType};

/// A continuous-time or stepped simulation unit driven from outside.
///
/// The unit owns its integrator. Drivers only ask it to advance to a time,
/// read event indicators, and run its event iteration at an event instant.
/// Speculative integration relies on [`save_state`](Self::save_state) and
/// [`restore_state`](Self::restore_state) producing exact, independent
/// copies of the full internal state.
///
/// Typed accessors (`get_real`, `set_integer`, ...) are provided on top of
/// [`get`](Self::get) and [`set`](Self::set) and report a
/// [`ValueError::TypeMismatch`] when the unit answers with another type.
pub trait SimulationUnit {
    /// Opaque copy of the unit's time, continuous states and discrete states.
    type State: Clone;
    type Error: std::error::Error + From<ValueError> + Send + Sync + 'static;

    /// Returns the current unit time.
    fn time(&self) -> f64;

    /// Reads variable `name` as a value of type `var_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown or has another type.
    fn get(&self, name: &str, var_type: VarType) -> Result<Value, Self::Error>;

    /// Writes variable `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown, read-only, or the value
    /// has the wrong type.
    fn set(&mut self, name: &str, value: &Value) -> Result<(), Self::Error>;

    /// Completes initialization at `start_time` using the values set so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be initialized.
    fn initialize(&mut self, start_time: f64) -> Result<(), Self::Error>;

    /// Integrates the continuous dynamics up to `to` without handling events.
    ///
    /// Returns the time actually reached.
    ///
    /// # Errors
    ///
    /// Returns an error if integration fails or `to` lies in the past.
    fn advance(&mut self, to: f64) -> Result<f64, Self::Error>;

    /// Returns the current event indicator values.
    ///
    /// A state event occurs wherever an indicator changes sign.
    ///
    /// # Errors
    ///
    /// Returns an error if the indicators cannot be evaluated.
    fn event_indicators(&self) -> Result<Vec<f64>, Self::Error>;

    /// Returns the next scheduled time event, if any.
    fn next_time_event(&self) -> Option<f64> {
        None
    }

    /// Runs the event iteration at the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the event iteration fails.
    fn handle_events(&mut self) -> Result<(), Self::Error>;

    /// Copies the full internal state.
    fn save_state(&self) -> Self::State;

    /// Overwrites the full internal state with `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if `state` cannot be applied to this unit.
    fn restore_state(&mut self, state: &Self::State) -> Result<(), Self::Error>;

    /// Reads a real variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown or not real.
    fn get_real(&self, name: &str) -> Result<f64, Self::Error> {
        Ok(self.get(name, VarType::Real)?.into_real(name)?)
    }

    /// Reads an integer variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown or not an integer.
    fn get_integer(&self, name: &str) -> Result<i32, Self::Error> {
        Ok(self.get(name, VarType::Integer)?.into_integer(name)?)
    }

    /// Reads a boolean variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown or not a boolean.
    fn get_boolean(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.get(name, VarType::Boolean)?.into_boolean(name)?)
    }

    /// Reads a string variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown or not a string.
    fn get_string(&self, name: &str) -> Result<String, Self::Error> {
        Ok(self.get(name, VarType::String)?.into_string(name)?)
    }

    /// Writes a real variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown, read-only, or not real.
    fn set_real(&mut self, name: &str, value: f64) -> Result<(), Self::Error> {
        self.set(name, &Value::Real(value))
    }

    /// Writes an integer variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown, read-only, or not an integer.
    fn set_integer(&mut self, name: &str, value: i32) -> Result<(), Self::Error> {
        self.set(name, &Value::Integer(value))
    }

    /// Writes a boolean variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown, read-only, or not a boolean.
    fn set_boolean(&mut self, name: &str, value: bool) -> Result<(), Self::Error> {
        self.set(name, &Value::Boolean(value))
    }

    /// Writes a string variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unknown, read-only, or not a string.
    fn set_string(&mut self, name: &str, value: &str) -> Result<(), Self::Error> {
        self.set(name, &Value::String(value.to_owned()))
    }
}
