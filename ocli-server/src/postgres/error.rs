// ocli Postgres Layer - Error Types
//
// Errors from the direct PostgreSQL administration client. Every variant that
// originates in the driver keeps the driver's message.

use std::fmt;
use std::time::Duration;

/// Errors that can occur during administration operations
#[derive(Debug)]
pub enum PgAdminError {
    /// Database name rejected before any statement was sent
    InvalidName(String),
    /// Could not open or verify a connection
    ConnectionFailed(String),
    /// Connect or ping did not finish in time
    Timeout {
        operation: String,
        duration: Duration,
    },
    /// A statement failed
    QueryFailed { context: String, message: String },
    /// Connection pool exhausted
    PoolExhausted,
    /// Pool closed while an operation was in flight
    PoolClosed,
    /// Unknown `sslmode` value
    InvalidSslMode(String),
}

impl PgAdminError {
    /// Attach a description of the failed operation to a driver error.
    pub fn query(context: impl Into<String>, err: sqlx::Error) -> Self {
        match Self::from(err) {
            Self::QueryFailed { message, .. } => Self::QueryFailed {
                context: context.into(),
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for PgAdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid database name: {:?}", name),
            Self::ConnectionFailed(msg) => write!(f, "Database connection failed: {}", msg),
            Self::Timeout {
                operation,
                duration,
            } => write!(f, "Timeout after {:?} waiting for: {}", duration, operation),
            Self::QueryFailed { context, message } => write!(f, "failed to {}: {}", context, message),
            Self::PoolExhausted => write!(f, "Database connection pool exhausted"),
            Self::PoolClosed => write!(f, "Database connection pool closed"),
            Self::InvalidSslMode(mode) => write!(f, "unknown sslmode: {:?}", mode),
        }
    }
}

impl std::error::Error for PgAdminError {}

impl From<sqlx::Error> for PgAdminError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            sqlx::Error::Io(e) => Self::ConnectionFailed(e.to_string()),
            sqlx::Error::Tls(e) => Self::ConnectionFailed(e.to_string()),
            _ => Self::QueryFailed {
                context: "execute statement".to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Result type for administration operations
pub type PgAdminResult<T> = Result<T, PgAdminError>;
