use crate::{
    Argument, AsValue, DataError, Parameter, Parameters, Result, TransactionId, Value,
    truncate_long, util::separated_by,
};
use std::{
    fmt::{self, Display, Write},
    time::Duration,
};

/// Caller-authored command: portable text with `{Name}` / `{0}` placeholders and its bindings.
///
/// Positional and named bindings are mutually exclusive, mixing them is
/// rejected when the statement is bound.
///
/// ```rust
/// use conduit_core::Statement;
/// let statement = Statement::new("SELECT * FROM users WHERE id = {0}").bind(7);
/// assert_eq!(statement.arguments().len(), 1);
/// ```
#[derive(Default, Debug, Clone)]
pub struct Statement {
    pub(crate) text: String,
    pub(crate) positional: Vec<Argument>,
    pub(crate) named: Vec<(String, Value)>,
    pub(crate) timeout: Option<Duration>,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
    /// Statement whose `{0}`, `{1}`, ... placeholders are bound to `arguments`.
    pub fn positional(text: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self {
            text: text.into(),
            positional: arguments,
            ..Default::default()
        }
    }
    /// Statement whose `{Name}` placeholders are bound to the values of `parameters`.
    pub fn named(text: impl Into<String>, parameters: &impl Parameters) -> Self {
        Self {
            text: text.into(),
            named: parameters.parameters(),
            ..Default::default()
        }
    }
    /// Appends a positional argument.
    pub fn bind(mut self, argument: impl Into<Argument>) -> Self {
        self.positional.push(argument.into());
        self
    }
    /// Appends a named value.
    pub fn bind_named(mut self, name: impl Into<String>, value: impl AsValue) -> Self {
        self.named.push((name.into(), value.as_value()));
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn arguments(&self) -> &[Argument] {
        &self.positional
    }
    pub fn named_values(&self) -> &[(String, Value)] {
        &self.named
    }
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl From<&str> for Statement {
    fn from(value: &str) -> Self {
        Statement::new(value)
    }
}

impl From<String> for Statement {
    fn from(value: String) -> Self {
        Statement::new(value)
    }
}

impl From<&String> for Statement {
    fn from(value: &String) -> Self {
        Statement::new(value.as_str())
    }
}

/// A command ready to be executed by a driver: vendor-native text and parameters.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Command {
    pub text: String,
    pub parameters: Vec<Parameter>,
    pub timeout: Option<Duration>,
    /// Local transaction the command runs in, attached by `DataAccess::bind_to_command`.
    pub transaction: Option<TransactionId>,
}

impl Command {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }
    /// Overwrites the parameter values in order, keeping names and directions.
    pub fn rebind(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.parameters.len() {
            return Err(DataError::argument(format!(
                "Expected {} values but got {} while rebinding the command",
                self.parameters.len(),
                values.len()
            )));
        }
        for (parameter, value) in self.parameters.iter_mut().zip(values) {
            parameter.value = value;
        }
        Ok(())
    }
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.text))?;
        if !self.parameters.is_empty() {
            let mut out = String::new();
            separated_by(
                &mut out,
                &self.parameters,
                |out, p| {
                    let _ = write!(out, "{}={}", p.name, p.value);
                },
                ", ",
            );
            write!(f, " [{}]", truncate_long!(out))?;
        }
        Ok(())
    }
}
