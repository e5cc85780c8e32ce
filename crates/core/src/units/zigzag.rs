use crate::{
    unit::SimulationUnit,
    value::{Value, ValueError, VarType},
};

use super::{UnitError, check_forward, check_type};

/// A ramp that reflects between `-1` and `1`.
///
/// Variables:
///
/// | name       | type    | access     |
/// |------------|---------|------------|
/// | `x`        | real    | read/write |
/// | `der(x)`   | real    | read       |
/// | `k`        | real    | read/write |
/// | `x0`       | real    | read/write |
/// | `crossings`| integer | read       |
/// | `rising`   | boolean | read       |
/// | `label`    | string  | read/write |
///
/// On initialization `x = x0` and the slope is `k`; reflections happen only
/// when the driver runs [`handle_events`](SimulationUnit::handle_events) after
/// the single event indicator changes sign. Writing `k` after initialization
/// rescales the current slope and keeps its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Zigzag {
    time: f64,
    x: f64,
    der: f64,
    k: f64,
    x0: f64,
    crossings: i32,
    label: String,
}

impl Zigzag {
    /// Creates an uninitialized unit with `k = 1` and `x0 = 0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            time: 0.0,
            x: 0.0,
            der: 0.0,
            k: 1.0,
            x0: 0.0,
            crossings: 0,
            label: String::new(),
        }
    }

    fn declared_type(name: &str) -> Option<VarType> {
        match name {
            "x" | "der(x)" | "k" | "x0" => Some(VarType::Real),
            "crossings" => Some(VarType::Integer),
            "rising" => Some(VarType::Boolean),
            "label" => Some(VarType::String),
            _ => None,
        }
    }
}

impl Default for Zigzag {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationUnit for Zigzag {
    type State = Zigzag;
    type Error = UnitError;

    fn time(&self) -> f64 {
        self.time
    }

    fn get(&self, name: &str, var_type: VarType) -> Result<Value, UnitError> {
        let declared = Self::declared_type(name).ok_or_else(|| ValueError::unknown(name))?;
        check_type(name, declared, var_type)?;

        let value = match name {
            "x" => Value::Real(self.x),
            "der(x)" => Value::Real(self.der),
            "k" => Value::Real(self.k),
            "x0" => Value::Real(self.x0),
            "crossings" => Value::Integer(self.crossings),
            "rising" => Value::Boolean(self.der > 0.0),
            _ => Value::String(self.label.clone()),
        };
        Ok(value)
    }

    fn set(&mut self, name: &str, value: &Value) -> Result<(), UnitError> {
        let declared = Self::declared_type(name).ok_or_else(|| ValueError::unknown(name))?;
        value.expect_type(name, declared)?;

        match (name, value) {
            ("x", Value::Real(v)) => self.x = *v,
            ("k", Value::Real(v)) => {
                self.k = *v;
                if self.der != 0.0 {
                    self.der = self.der.signum() * v.abs();
                }
            }
            ("x0", Value::Real(v)) => self.x0 = *v,
            ("label", Value::String(v)) => self.label.clone_from(v),
            _ => {
                return Err(ValueError::ReadOnly {
                    name: name.to_owned(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn initialize(&mut self, start_time: f64) -> Result<(), UnitError> {
        self.time = start_time;
        self.x = self.x0;
        self.der = self.k;
        self.k = self.k.abs();
        self.crossings = 0;
        Ok(())
    }

    fn advance(&mut self, to: f64) -> Result<f64, UnitError> {
        check_forward(self.time, to)?;
        self.x += self.der * (to - self.time);
        self.time = to;
        Ok(to)
    }

    fn event_indicators(&self) -> Result<Vec<f64>, UnitError> {
        let indicator = if self.x >= 1.0 {
            1.0
        } else if self.x <= -1.0 {
            -1.0
        } else if self.der > 0.0 {
            -1.0
        } else {
            1.0
        };
        Ok(vec![indicator])
    }

    fn handle_events(&mut self) -> Result<(), UnitError> {
        if self.x >= 1.0 && self.der > 0.0 {
            self.der = -self.k;
            self.crossings += 1;
        } else if self.x <= -1.0 && self.der < 0.0 {
            self.der = self.k;
            self.crossings += 1;
        }
        Ok(())
    }

    fn save_state(&self) -> Zigzag {
        self.clone()
    }

    fn restore_state(&mut self, state: &Zigzag) -> Result<(), UnitError> {
        self.clone_from(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn initialized(k: f64, x0: f64) -> Zigzag {
        let mut unit = Zigzag::new();
        unit.set_real("k", k).expect("k is writable");
        unit.set_real("x0", x0).expect("x0 is writable");
        unit.initialize(0.0).expect("should initialize");
        unit
    }

    #[test]
    fn initial_slope_is_k() {
        let unit = initialized(10.0, 0.0);
        assert_relative_eq!(unit.get_real("x").expect("x"), 0.0);
        assert_relative_eq!(unit.get_real("der(x)").expect("der(x)"), 10.0);
        assert_eq!(unit.event_indicators().expect("indicators"), vec![-1.0]);
    }

    #[test]
    fn indicator_flips_when_crossing_upper_bound() {
        let mut unit = initialized(1.0, 0.0);
        unit.advance(0.9).expect("advance");
        assert_eq!(unit.event_indicators().expect("indicators"), vec![-1.0]);

        unit.advance(1.1).expect("advance");
        assert_eq!(unit.event_indicators().expect("indicators"), vec![1.0]);

        unit.handle_events().expect("handle");
        assert_relative_eq!(unit.get_real("der(x)").expect("der(x)"), -1.0);
        assert_eq!(unit.get_integer("crossings").expect("crossings"), 1);
        assert!(!unit.get_boolean("rising").expect("rising"));
        assert_eq!(unit.event_indicators().expect("indicators"), vec![1.0]);
    }

    #[test]
    fn rejects_unknown_and_mistyped_access() {
        let mut unit = Zigzag::new();
        assert!(matches!(
            unit.set_real("ERR", 0.0),
            Err(UnitError::Value(ValueError::UnknownVariable { .. }))
        ));
        assert!(matches!(
            unit.set_integer("k", 1),
            Err(UnitError::Value(ValueError::TypeMismatch { .. }))
        ));
        assert!(matches!(
            unit.set_real("der(x)", 1.0),
            Err(UnitError::Value(ValueError::ReadOnly { .. }))
        ));
    }

    #[test]
    fn restore_rewinds_full_state() {
        let mut unit = initialized(1.0, 0.0);
        let saved = unit.save_state();
        unit.advance(0.5).expect("advance");
        unit.set_string("label", "moved").expect("label");

        unit.restore_state(&saved).expect("restore");
        assert_relative_eq!(unit.time(), 0.0);
        assert_relative_eq!(unit.get_real("x").expect("x"), 0.0);
        assert_eq!(unit.get_string("label").expect("label"), "");
    }

    #[test]
    fn refuses_to_integrate_backwards() {
        let mut unit = initialized(1.0, 0.0);
        unit.advance(0.5).expect("advance");
        assert!(matches!(
            unit.advance(0.25),
            Err(UnitError::Backwards { .. })
        ));
    }
}
