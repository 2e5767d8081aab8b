//! Custom error types for LaPlata
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for LaPlata operations
#[derive(Error, Debug)]
pub enum LaplataError {
    /// An operation that needs an owner was attempted without a session
    #[error("Usuario no autenticado")]
    NotAuthenticated,

    /// Failure reported by the persistence backend
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        code: Option<String>,
    },

    /// Transport-level failure talking to the hosted provider
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failure reported by the auth provider (raw provider message)
    #[error("{message}")]
    Auth { message: String },

    /// Validation errors for data models and forms
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// A dashboard source did not answer in time
    #[error("Timed out waiting for {source_name}")]
    Timeout { source_name: &'static str },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LaplataError {
    /// Create a backend error without a provider code
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
            code: None,
        }
    }

    /// Create an auth error carrying the provider's message
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a "not found" error for wallets
    pub fn wallet_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Wallet",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for incomes or expenses
    pub fn transaction_not_found(entity_type: &'static str, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from a missing session
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }
}

impl From<std::io::Error> for LaplataError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LaplataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::Error> for LaplataError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result type alias for LaPlata operations
pub type LaplataResult<T> = Result<T, LaplataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LaplataError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = LaplataError::wallet_not_found("Main");
        assert_eq!(err.to_string(), "Wallet not found: Main");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_auth_error_is_raw_message() {
        let err = LaplataError::auth("User already registered");
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn test_not_authenticated() {
        let err = LaplataError::NotAuthenticated;
        assert!(err.is_not_authenticated());
        assert_eq!(err.to_string(), "Usuario no autenticado");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LaplataError = io_err.into();
        assert!(matches!(err, LaplataError::Io(_)));
    }
}
