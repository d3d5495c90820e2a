use thiserror::Error;

/// Failures raised by the access layer itself.
///
/// They travel inside [`crate::Error`] so callers classify them with
/// `error.downcast_ref::<DataError>()`. Errors coming from a vendor driver are
/// never wrapped in this type, they propagate as produced by the driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// Missing or inconsistent input, raised before any I/O.
    #[error("invalid argument: {0}")]
    Argument(String),
    /// Malformed placeholder text or a query that cannot be paged.
    #[error("invalid command text: {0}")]
    Format(String),
    /// A local transaction was requested while another owner holds the connection.
    #[error("transaction conflict: {0}")]
    TransactionConflict(String),
    /// Operation on a transaction scope or connection that was already torn down.
    #[error("invalid state: {0}")]
    ResourceState(String),
}

impl DataError {
    pub fn argument(message: impl Into<String>) -> crate::Error {
        Self::Argument(message.into()).into()
    }
    pub fn format(message: impl Into<String>) -> crate::Error {
        Self::Format(message.into()).into()
    }
    pub fn transaction_conflict(message: impl Into<String>) -> crate::Error {
        Self::TransactionConflict(message.into()).into()
    }
    pub fn resource_state(message: impl Into<String>) -> crate::Error {
        Self::ResourceState(message.into()).into()
    }
}

/// Finds the [`DataError`] carried by `error`, if any, looking through added context.
pub fn data_error(error: &crate::Error) -> Option<&DataError> {
    error.chain().find_map(|e| e.downcast_ref::<DataError>())
}
