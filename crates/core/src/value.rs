use std::fmt;

use thiserror::Error;

/// The base type of a simulation unit variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarType {
    Real,
    Integer,
    Boolean,
    String,
}

impl VarType {
    /// All base types in registration order.
    pub const ALL: [VarType; 4] = [
        VarType::Real,
        VarType::Integer,
        VarType::Boolean,
        VarType::String,
    ];
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarType::Real => "real",
            VarType::Integer => "integer",
            VarType::Boolean => "boolean",
            VarType::String => "string",
        };
        f.write_str(name)
    }
}

/// A typed variable value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Real(f64),
    Integer(i32),
    Boolean(bool),
    String(String),
}

/// Errors raised when reading or writing typed values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("unknown variable `{name}`")]
    UnknownVariable { name: String },

    #[error("variable `{name}` expects {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: VarType,
        found: VarType,
    },

    #[error("variable `{name}` is read-only")]
    ReadOnly { name: String },
}

impl ValueError {
    /// Convenience constructor for an unknown variable name.
    pub fn unknown(name: &str) -> Self {
        Self::UnknownVariable {
            name: name.to_owned(),
        }
    }
}

impl Value {
    /// Returns the base type of this value.
    #[must_use]
    pub fn var_type(&self) -> VarType {
        match self {
            Value::Real(_) => VarType::Real,
            Value::Integer(_) => VarType::Integer,
            Value::Boolean(_) => VarType::Boolean,
            Value::String(_) => VarType::String,
        }
    }

    /// Checks that this value has the `expected` type for variable `name`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` if the types differ.
    pub fn expect_type(&self, name: &str, expected: VarType) -> Result<(), ValueError> {
        let found = self.var_type();
        if found == expected {
            Ok(())
        } else {
            Err(ValueError::TypeMismatch {
                name: name.to_owned(),
                expected,
                found,
            })
        }
    }

    /// Unwraps a real value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` for any other variant.
    pub fn into_real(self, name: &str) -> Result<f64, ValueError> {
        match self {
            Value::Real(v) => Ok(v),
            other => Err(other.mismatch(name, VarType::Real)),
        }
    }

    /// Unwraps an integer value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` for any other variant.
    pub fn into_integer(self, name: &str) -> Result<i32, ValueError> {
        match self {
            Value::Integer(v) => Ok(v),
            other => Err(other.mismatch(name, VarType::Integer)),
        }
    }

    /// Unwraps a boolean value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` for any other variant.
    pub fn into_boolean(self, name: &str) -> Result<bool, ValueError> {
        match self {
            Value::Boolean(v) => Ok(v),
            other => Err(other.mismatch(name, VarType::Boolean)),
        }
    }

    /// Unwraps a string value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::TypeMismatch` for any other variant.
    pub fn into_string(self, name: &str) -> Result<String, ValueError> {
        match self {
            Value::String(v) => Ok(v),
            other => Err(other.mismatch(name, VarType::String)),
        }
    }

    fn mismatch(&self, name: &str, expected: VarType) -> ValueError {
        ValueError::TypeMismatch {
            name: name.to_owned(),
            expected,
            found: self.var_type(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}
