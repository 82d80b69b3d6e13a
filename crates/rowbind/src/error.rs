//! Error types for rowbind

use thiserror::Error;

/// Result type alias for rowbind operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Boxed driver error, kept verbatim as the `source` of connection/execution failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for mapping and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Rejected input, detected before any round trip
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record or column type that cannot be introspected or decoded
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Opening or probing a session failed
    #[error("Connection error: {0}")]
    Connection(#[source] BoxError),

    /// The driver reported a failure while running a statement
    #[error("Execution error: {0}")]
    Execution(#[source] BoxError),

    /// Row-to-field binding failed
    #[error("Scan error on column {index} ('{column}'): {message}")]
    Scan {
        index: usize,
        column: String,
        message: String,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Statement timeout error
    #[error("Statement timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration could not be loaded or is inconsistent
    #[error("Config error: {0}")]
    Config(String),
}

impl OrmError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an unsupported type error
    pub fn unsupported_type(message: impl Into<String>) -> Self {
        Self::UnsupportedType(message.into())
    }

    /// Wrap a driver error raised while connecting
    pub fn connection(err: impl Into<BoxError>) -> Self {
        Self::Connection(err.into())
    }

    /// Wrap a driver error raised while executing
    pub fn execution(err: impl Into<BoxError>) -> Self {
        Self::Execution(err.into())
    }

    /// Create a scan error for a specific column position
    pub fn scan(index: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            index,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is a scan error
    pub fn is_scan(&self) -> bool {
        matches!(self, Self::Scan { .. })
    }

    /// Check if the error was raised before reaching the database
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn execution_keeps_driver_error_as_source() {
        let io = std::io::Error::other("socket closed");
        let err = OrmError::execution(io);
        assert_eq!(err.to_string(), "Execution error: socket closed");
        assert_eq!(err.source().unwrap().to_string(), "socket closed");
    }

    #[test]
    fn scan_error_names_position_and_column() {
        let err = OrmError::scan(2, "age", "expected integer, found text");
        assert!(err.is_scan());
        assert_eq!(
            err.to_string(),
            "Scan error on column 2 ('age'): expected integer, found text"
        );
    }
}
