//! Error types for Tabula

use thiserror::Error;

/// The main error type for Tabula operations
#[derive(Error, Debug)]
pub enum Error {
    /// No usable connection or compiler could be resolved
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The driver handle is unusable (closed, failed to connect or prepare)
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// The driver rejected a statement while executing it
    #[error("Execution error: {message}")]
    Execution { message: String },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The builder was used in a way that cannot be compiled
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Tabula operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Whether the failure means the driver handle itself is unusable.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection { .. } => true,
            Error::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
                    | sqlx::Error::Configuration(_)
            ),
            _ => false,
        }
    }

    /// Whether the error was raised synchronously by a malformed builder call.
    pub fn is_misuse(&self) -> bool {
        matches!(self, Error::InvalidQuery { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_error() {
        let err = Error::invalid_query("No table specified");
        assert!(err.is_misuse());
        assert_eq!(err.to_string(), "Invalid query: No table specified");
    }

    #[test]
    fn test_configuration_error() {
        let err = Error::configuration("No database connection found");
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(
            err.to_string(),
            "Configuration error: No database connection found"
        );
    }

    #[test]
    fn test_connection_classification() {
        assert!(Error::connection("closed").is_connection_error());
        assert!(Error::Database(sqlx::Error::PoolClosed).is_connection_error());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_connection_error());
        assert!(!Error::execution("UNIQUE constraint failed").is_connection_error());
    }

    #[test]
    fn test_execution_error_display() {
        let err = Error::execution("no such table: users");
        assert!(!err.is_misuse());
        assert_eq!(err.to_string(), "Execution error: no such table: users");
    }
}
