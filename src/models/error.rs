use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum TkConfigError {
    #[error("Command not found at position {0}")]
    CommandNotFound(usize),

    #[error("Contact not found at position {0}")]
    ContactNotFound(usize),

    #[error("Duplicate command: {0}")]
    DuplicateCommand(String),

    #[error("SMS sending failed to {phone}: {message}")]
    SendFailed { phone: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("File error for {path}: {message}")]
    Io { path: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {message}")]
    DatabaseError { message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl TkConfigError {
    /// Check if this error can be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TkConfigError::SendFailed { .. } | TkConfigError::DatabaseError { .. }
        )
    }

    /// Get a suggestion for recovering from this error
    pub fn recovery_suggestion(&self) -> &str {
        match self {
            TkConfigError::CommandNotFound(_) => "Reload the command list",
            TkConfigError::ContactNotFound(_) => "Reload the GPS contact list",
            TkConfigError::DuplicateCommand(_) => "Edit the existing command instead",
            TkConfigError::SendFailed { .. } => "Check the phone signal and try again",
            TkConfigError::InvalidConfiguration(_) => "Review your configuration",
            TkConfigError::ParseError(_) => "Check the file content",
            TkConfigError::Io { .. } => "Check the file path and its permissions",
            TkConfigError::Internal(_) => "Restart the application and try again",
            TkConfigError::DatabaseError { .. } => "Try restarting the application",
            TkConfigError::NotFound { .. } => "The requested item may have been deleted",
            TkConfigError::InvalidOperation { .. } => "This operation is not allowed",
        }
    }

    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        TkConfigError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for TkConfigError {
    fn from(err: rusqlite::Error) -> Self {
        TkConfigError::DatabaseError {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TkConfigError>;
