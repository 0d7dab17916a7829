//! Error types for secret resolution operations.

use thiserror::Error;

/// Result type for secret resolution operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving secrets.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the backend (name or that specific version is absent).
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// The backend refused the request for authorization reasons.
    #[error("Access denied for secret '{key}': {reason}")]
    AccessDenied { key: String, reason: String },

    /// A backend name was used that has no registered backend.
    #[error("Unknown backend '{name}' (registered backends: {})", .available.join(", "))]
    UnknownBackend { name: String, available: Vec<String> },

    /// Startup validation failed for one or more registered requirements.
    ///
    /// Fatal: the application must not complete startup when this is returned.
    #[error("Secret validation failed with {count} error(s): {}", .failures.join("; "))]
    ValidationFailed { count: usize, failures: Vec<String> },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Opaque backend failure (transport errors not mapped to NotFound/AccessDenied).
    ///
    /// Propagated unchanged; this crate does not classify or retry these.
    #[error("Backend error: {message}")]
    Backend { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an access denied error.
    pub fn access_denied(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AccessDenied { key: key.into(), reason: reason.into() }
    }

    /// Create an unknown backend error listing the registered backend names.
    pub fn unknown_backend(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::UnknownBackend { name: name.into(), available }
    }

    /// Create an aggregate validation error from individual failure messages.
    pub fn validation_failed(failures: Vec<String>) -> Self {
        Self::ValidationFailed { count: failures.len(), failures }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create an opaque backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }

    /// Whether this error is a missing-secret failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
