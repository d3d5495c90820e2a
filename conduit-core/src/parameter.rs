use crate::{AsValue, Value, as_value::named_values};
use std::collections::{BTreeMap, HashMap};

/// How a parameter value flows between the caller and the backend.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

/// A vendor-native parameter: the marker name as it appears in the command text and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: Value,
    pub direction: Direction,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl AsValue) -> Self {
        Self {
            name: name.into(),
            value: value.as_value(),
            direction: Direction::Input,
        }
    }
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// One entry of a positional argument list.
///
/// A list must be made either entirely of values (bound to `{0}`, `{1}`, ...) or
/// entirely of pre-built parameters (attached as they are).
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Value(Value),
    Parameter(Parameter),
}

impl Argument {
    pub fn into_value(self) -> Value {
        match self {
            Argument::Value(v) => v,
            Argument::Parameter(p) => p.value,
        }
    }
}

impl<T: AsValue> From<T> for Argument {
    fn from(value: T) -> Self {
        Argument::Value(value.as_value())
    }
}

impl From<Parameter> for Argument {
    fn from(value: Parameter) -> Self {
        Argument::Parameter(value)
    }
}

/// Source of named values for `{Name}` placeholders.
///
/// Implemented by `#[derive(Parameters)]` structs, where fields marked
/// `#[conduit(ignore)]` are left out, and by the common map types.
/// Names are returned without any vendor prefix, in a stable order.
pub trait Parameters {
    fn parameters(&self) -> Vec<(String, Value)>;
}

impl<T: Parameters + ?Sized> Parameters for &T {
    fn parameters(&self) -> Vec<(String, Value)> {
        (*self).parameters()
    }
}

impl<K, V, S> Parameters for HashMap<K, V, S>
where
    K: AsRef<str>,
    V: AsValue + Clone,
{
    fn parameters(&self) -> Vec<(String, Value)> {
        named_values(self.iter().map(|(k, v)| (k.as_ref(), v.clone())))
    }
}

impl<K, V> Parameters for BTreeMap<K, V>
where
    K: AsRef<str>,
    V: AsValue + Clone,
{
    fn parameters(&self) -> Vec<(String, Value)> {
        named_values(self.iter().map(|(k, v)| (k.as_ref(), v.clone())))
    }
}

impl<K, V> Parameters for [(K, V)]
where
    K: AsRef<str>,
    V: AsValue + Clone,
{
    fn parameters(&self) -> Vec<(String, Value)> {
        named_values(self.iter().map(|(k, v)| (k.as_ref(), v.clone())))
    }
}

impl<K, V> Parameters for Vec<(K, V)>
where
    K: AsRef<str>,
    V: AsValue + Clone,
{
    fn parameters(&self) -> Vec<(String, Value)> {
        self.as_slice().parameters()
    }
}

impl<K, V, const N: usize> Parameters for [(K, V); N]
where
    K: AsRef<str>,
    V: AsValue + Clone,
{
    fn parameters(&self) -> Vec<(String, Value)> {
        self.as_slice().parameters()
    }
}
