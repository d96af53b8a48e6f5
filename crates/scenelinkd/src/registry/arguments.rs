//! Typed access to the `arguments` object of a `tools/call` request.

use serde_json::{Map, Value};

use super::OperationError;

/// Argument object handed to an operation.
///
/// Absent and `null` argument objects are both presented as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    /// Wraps an argument map.
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// Whether no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String argument that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::MissingArgument`] when absent and
    /// [`OperationError::InvalidArgument`] when not a string.
    pub fn required_str(&self, name: &str) -> Result<&str, OperationError> {
        self.optional_str(name)?
            .ok_or_else(|| OperationError::MissingArgument {
                name: name.to_owned(),
            })
    }

    /// String argument that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidArgument`] when present but not a
    /// string.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, OperationError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text)),
            Some(_) => Err(OperationError::invalid(name, "expected a string")),
        }
    }

    /// Numeric argument that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidArgument`] when present but not a
    /// number.
    pub fn optional_f64(&self, name: &str) -> Result<Option<f64>, OperationError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| OperationError::invalid(name, "expected a number")),
        }
    }

    /// Boolean argument that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidArgument`] when present but not a
    /// boolean.
    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, OperationError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| OperationError::invalid(name, "expected a boolean")),
        }
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self::new(map)
    }
}
