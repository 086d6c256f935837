//! Domain error types
//!
//! All fallible operations in Sextant return [`SextantError`]. Transport faults
//! from the warehouse are kept in their own enum so the retry loop can classify
//! them without looking at third-party types.

use thiserror::Error;

/// Main Sextant error type
#[derive(Debug, Error)]
pub enum SextantError {
    /// Missing or invalid configuration. Raised before any network attempt.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Warehouse transport errors
    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    /// The warehouse accepted the request but rejected one or more rows
    #[error("{0}")]
    SendEvents(String),

    /// Credential acquisition failed
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Database errors that are not raised by the SQL driver itself
    /// (pool exhaustion, TLS setup)
    #[error("Database error: {0}")]
    Database(String),

    /// SQL errors from the checksum query, passed through untouched
    #[error(transparent)]
    Query(#[from] tokio_postgres::Error),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SextantError {
    /// Whether the retry loop should try the operation again
    pub fn is_transient(&self) -> bool {
        match self {
            SextantError::Warehouse(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Process exit code used by the CLI for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SextantError::SendEvents(_) => 1,
            SextantError::Configuration(_) => 2,
            SextantError::Authentication(_) => 3,
            SextantError::Warehouse(_) | SextantError::Database(_) | SextantError::Query(_) => 4,
            _ => 5,
        }
    }
}

/// Warehouse transport errors
///
/// Connection failures, timeouts, throttling and 5xx responses are transient.
/// Everything else is returned to the caller on the first occurrence.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Failed to reach the warehouse
    #[error("Failed to connect to warehouse: {0}")]
    Connection(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Throttled (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response from warehouse: {0}")]
    InvalidResponse(String),
}

impl WarehouseError {
    /// Whether the failure is worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WarehouseError::Connection(_)
                | WarehouseError::Timeout(_)
                | WarehouseError::RateLimited(_)
                | WarehouseError::ServerError { .. }
        )
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => WarehouseError::RateLimited(message),
            500..=599 => WarehouseError::ServerError { status, message },
            _ => WarehouseError::ClientError { status, message },
        }
    }
}

impl From<reqwest::Error> for WarehouseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WarehouseError::Timeout(err.to_string())
        } else if err.is_decode() {
            WarehouseError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            WarehouseError::from_status(status.as_u16(), err.to_string())
        } else {
            WarehouseError::Connection(err.to_string())
        }
    }
}

impl From<std::io::Error> for SextantError {
    fn from(err: std::io::Error) -> Self {
        SextantError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SextantError {
    fn from(err: serde_json::Error) -> Self {
        SextantError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SextantError {
    fn from(err: toml::de::Error) -> Self {
        SextantError::Configuration(format!("TOML parse error: {err}"))
    }
}
