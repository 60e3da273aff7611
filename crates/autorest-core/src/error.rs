//! Error taxonomy shared by the catalog, the engine and the adapters.

use thiserror::Error;

/// Category of a failure, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Discovery,
    Execution,
}

impl ErrorKind {
    /// Stable name surfaced to API clients in the `error` field.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Auth => "AuthError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Discovery => "DiscoveryError",
            ErrorKind::Execution => "ExecutionError",
        }
    }
}

/// Errors produced while validating or executing a request.
///
/// `Discovery` and `Execution` carry driver detail for logging only; use
/// [`EngineError::public_message`] for anything a client will see.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input, unknown column, unsupported operator.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown or unexposed table, missing row.
    #[error("not found: {0}")]
    NotFound(String),

    /// The metadata query failed.
    #[error("schema discovery failed: {0}")]
    Discovery(String),

    /// The backing store rejected or could not run a statement.
    #[error("statement execution failed: {0}")]
    Execution(String),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        EngineError::NotFound(message.into())
    }

    /// A write rejected by a not-null, unique, foreign-key or check
    /// constraint. The message names no constraint or value.
    pub fn constraint_violation() -> Self {
        EngineError::Validation("The request violates a constraint on the target table".to_string())
    }

    /// A value the column type could not accept.
    pub fn invalid_data() -> Self {
        EngineError::Validation("The request contains a value the column cannot store".to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Discovery(_) => ErrorKind::Discovery,
            EngineError::Execution(_) => ErrorKind::Execution,
        }
    }

    /// Message that is safe to return to a client.
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Validation(msg) | EngineError::NotFound(msg) => msg.clone(),
            EngineError::Discovery(_) => "Unable to read the database catalog".to_string(),
            EngineError::Execution(_) => "The database could not complete the request".to_string(),
        }
    }
}
