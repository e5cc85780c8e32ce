//! Typed variable sets, value vectors and initialization checks shared by
//! the drivers.

use std::error::Error as StdError;

use cosim_core::{SimulationUnit, Status, Value, VarType};
use thiserror::Error;

/// Ordered variable names per base type.
///
/// Registration order defines the layout of every [`TypedValues`] read
/// through the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarSet {
    real: Vec<String>,
    integer: Vec<String>,
    boolean: Vec<String>,
    string: Vec<String>,
}

impl VarSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the names registered for `group`.
    #[must_use]
    pub fn names(&self, group: VarType) -> &[String] {
        match group {
            VarType::Real => &self.real,
            VarType::Integer => &self.integer,
            VarType::Boolean => &self.boolean,
            VarType::String => &self.string,
        }
    }

    /// Replaces the names registered for `group`.
    pub fn define<I, N>(&mut self, group: VarType, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let names = names.into_iter().map(Into::into).collect();
        match group {
            VarType::Real => self.real = names,
            VarType::Integer => self.integer = names,
            VarType::Boolean => self.boolean = names,
            VarType::String => self.string = names,
        }
    }

    /// Returns true if no group has any names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        VarType::ALL.iter().all(|&group| self.names(group).is_empty())
    }
}

/// One value vector per base type, laid out like a [`VarSet`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypedValues {
    pub real: Vec<f64>,
    pub integer: Vec<i32>,
    pub boolean: Vec<bool>,
    pub string: Vec<String>,
}

impl TypedValues {
    /// Returns the number of values held for `group`.
    #[must_use]
    pub fn len(&self, group: VarType) -> usize {
        match group {
            VarType::Real => self.real.len(),
            VarType::Integer => self.integer.len(),
            VarType::Boolean => self.boolean.len(),
            VarType::String => self.string.len(),
        }
    }

    /// Linearly interpolates real values towards `other`.
    ///
    /// Integer, boolean and string values are taken from `self`.
    #[must_use]
    pub fn lerp(&self, other: &Self, theta: f64) -> Self {
        let real = self
            .real
            .iter()
            .zip(&other.real)
            .map(|(a, b)| a + theta * (b - a))
            .collect();

        Self {
            real,
            ..self.clone()
        }
    }

    /// Reads every variable of `vars` from `unit`.
    pub(crate) fn read<U: SimulationUnit>(unit: &U, vars: &VarSet) -> Result<Self, U::Error> {
        Ok(Self {
            real: collect(vars.names(VarType::Real), |n| unit.get_real(n))?,
            integer: collect(vars.names(VarType::Integer), |n| unit.get_integer(n))?,
            boolean: collect(vars.names(VarType::Boolean), |n| unit.get_boolean(n))?,
            string: collect(vars.names(VarType::String), |n| unit.get_string(n))?,
        })
    }

    /// Writes these values to the variables of `vars`, pairing by position.
    pub(crate) fn write<U: SimulationUnit>(
        &self,
        unit: &mut U,
        vars: &VarSet,
    ) -> Result<(), U::Error> {
        for (name, &v) in vars.names(VarType::Real).iter().zip(&self.real) {
            unit.set_real(name, v)?;
        }
        for (name, &v) in vars.names(VarType::Integer).iter().zip(&self.integer) {
            unit.set_integer(name, v)?;
        }
        for (name, &v) in vars.names(VarType::Boolean).iter().zip(&self.boolean) {
            unit.set_boolean(name, v)?;
        }
        for (name, v) in vars.names(VarType::String).iter().zip(&self.string) {
            unit.set_string(name, v)?;
        }
        Ok(())
    }

    /// Returns the first group whose length differs from `vars`, as
    /// `(group, expected, got)`.
    pub(crate) fn shape_mismatch(&self, vars: &VarSet) -> Option<(VarType, usize, usize)> {
        VarType::ALL.into_iter().find_map(|group| {
            let expected = vars.names(group).len();
            let got = self.len(group);
            (expected != got).then_some((group, expected, got))
        })
    }
}

fn collect<T, E>(names: &[String], read: impl Fn(&str) -> Result<T, E>) -> Result<Vec<T>, E> {
    names.iter().map(|name| read(name.as_str())).collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Group<T> {
    names: Vec<String>,
    values: Vec<T>,
}

impl<T> Default for Group<T> {
    fn default() -> Self {
        Self {
            names: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone + Into<Value>> Group<T> {
    fn new<I, N, V>(names: I, values: V) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        V: IntoIterator<Item = T>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            values: values.into_iter().collect(),
        }
    }

    fn entries(&self) -> (&[String], Vec<Value>) {
        (&self.names, self.values.iter().cloned().map(Into::into).collect())
    }
}

/// Start values written to the unit during initialization.
///
/// Names and values pair by position; a length mismatch fails validation of
/// that group.
///
/// ```
/// use cosim_drivers::io::InitValues;
///
/// let values = InitValues::new().with_reals(["k", "x"], [10.0, 0.0]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitValues {
    real: Group<f64>,
    integer: Group<i32>,
    boolean: Group<bool>,
    string: Group<String>,
}

impl InitValues {
    /// Creates an empty set of start values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reals<I, N, V>(mut self, names: I, values: V) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        V: IntoIterator<Item = f64>,
    {
        self.real = Group::new(names, values);
        self
    }

    #[must_use]
    pub fn with_integers<I, N, V>(mut self, names: I, values: V) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        V: IntoIterator<Item = i32>,
    {
        self.integer = Group::new(names, values);
        self
    }

    #[must_use]
    pub fn with_booleans<I, N, V>(mut self, names: I, values: V) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        V: IntoIterator<Item = bool>,
    {
        self.boolean = Group::new(names, values);
        self
    }

    #[must_use]
    pub fn with_strings<I, N, V, S>(mut self, names: I, values: V) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.string = Group::new(names, values.into_iter().map(Into::into));
        self
    }

    fn entries(&self, group: VarType) -> (&[String], Vec<Value>) {
        match group {
            VarType::Real => self.real.entries(),
            VarType::Integer => self.integer.entries(),
            VarType::Boolean => self.boolean.entries(),
            VarType::String => self.string.entries(),
        }
    }
}

/// The first validation failure found in one variable group.
#[derive(Debug, Error)]
pub enum GroupFailure {
    #[error("{group} group has {names} names but {values} values")]
    CountMismatch {
        group: VarType,
        names: usize,
        values: usize,
    },

    #[error("{group} variable `{name}` rejected")]
    Variable {
        group: VarType,
        name: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl GroupFailure {
    /// Returns the group that failed.
    #[must_use]
    pub fn group(&self) -> VarType {
        match self {
            Self::CountMismatch { group, .. } | Self::Variable { group, .. } => *group,
        }
    }
}

/// Errors that can occur while initializing a driver.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("driver is already initialized")]
    AlreadyInitialized,

    #[error("{} variable group(s) failed validation", .failures.len())]
    Variables { failures: Vec<GroupFailure> },

    #[error("unit failed to initialize")]
    Unit(#[source] Box<dyn StdError + Send + Sync>),
}

impl InitError {
    pub(crate) fn unit<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Unit(Box::new(err))
    }

    /// Returns the groups that failed validation, in registration order.
    #[must_use]
    pub fn failed_groups(&self) -> Vec<VarType> {
        match self {
            Self::Variables { failures } => failures.iter().map(GroupFailure::group).collect(),
            _ => Vec::new(),
        }
    }

    /// Maps this error to an ordinal status.
    #[must_use]
    pub fn status(&self) -> Status {
        Status::Error
    }
}

/// Writes `values` to `unit` and checks every name in `registered`.
///
/// Each group is validated independently; the first failure of a group is
/// reported and does not prevent checking the remaining groups.
pub(crate) fn validate<U: SimulationUnit>(
    unit: &mut U,
    values: &InitValues,
    registered: &[&VarSet],
) -> Vec<GroupFailure> {
    VarType::ALL
        .into_iter()
        .filter_map(|group| validate_group(unit, values, registered, group).err())
        .collect()
}

fn validate_group<U: SimulationUnit>(
    unit: &mut U,
    values: &InitValues,
    registered: &[&VarSet],
    group: VarType,
) -> Result<(), GroupFailure> {
    let (names, entries) = values.entries(group);
    if names.len() != entries.len() {
        return Err(GroupFailure::CountMismatch {
            group,
            names: names.len(),
            values: entries.len(),
        });
    }

    let rejected = |name: &str, err: U::Error| GroupFailure::Variable {
        group,
        name: name.to_owned(),
        source: Box::new(err),
    };

    for (name, value) in names.iter().zip(&entries) {
        unit.set(name, value).map_err(|e| rejected(name, e))?;
    }

    for name in registered.iter().flat_map(|set| set.names(group)) {
        unit.get(name, group)
            .and_then(|v| v.expect_type(name, group).map_err(U::Error::from))
            .map_err(|e| rejected(name, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use cosim_core::units::Zigzag;

    #[test]
    fn reads_and_writes_in_registration_order() {
        let mut unit = Zigzag::new();
        let mut vars = VarSet::new();
        vars.define(VarType::Real, ["k", "x0"]);
        vars.define(VarType::String, ["label"]);

        let values = TypedValues {
            real: vec![3.0, 0.5],
            string: vec!["a".to_owned()],
            ..TypedValues::default()
        };
        values.write(&mut unit, &vars).expect("should write");

        let read = TypedValues::read(&unit, &vars).expect("should read");
        assert_eq!(read, values);
    }

    #[test]
    fn lerp_interpolates_reals_only() {
        let left = TypedValues {
            real: vec![0.0, 10.0],
            integer: vec![1],
            ..TypedValues::default()
        };
        let right = TypedValues {
            real: vec![1.0, 20.0],
            integer: vec![2],
            ..TypedValues::default()
        };

        let mid = left.lerp(&right, 0.25);
        assert_relative_eq!(mid.real[0], 0.25);
        assert_relative_eq!(mid.real[1], 12.5);
        assert_eq!(mid.integer, vec![1]);
    }

    #[test]
    fn reports_shape_mismatch() {
        let mut vars = VarSet::new();
        vars.define(VarType::Boolean, ["rising"]);
        assert_eq!(
            TypedValues::default().shape_mismatch(&vars),
            Some((VarType::Boolean, 1, 0))
        );
    }

    #[test]
    fn validates_each_group_independently() {
        let mut unit = Zigzag::new();
        let values = InitValues::new()
            .with_reals(["k", "ERR"], [1.0, 2.0])
            .with_integers(["crossings"], [])
            .with_strings(["label"], ["ok"]);

        let mut outputs = VarSet::new();
        outputs.define(VarType::Boolean, ["ERR_BOOLEAN"]);

        let failures = validate(&mut unit, &values, &[&outputs]);
        let groups: Vec<_> = failures.iter().map(GroupFailure::group).collect();
        assert_eq!(
            groups,
            vec![VarType::Real, VarType::Integer, VarType::Boolean]
        );
        assert!(matches!(
            failures[1],
            GroupFailure::CountMismatch {
                names: 1,
                values: 0,
                ..
            }
        ));
    }
}
