//! Error types for isolation operations.
//!
//! This module defines the error taxonomy used throughout the netisol
//! crates. All errors implement `std::error::Error` via `thiserror`.

use thiserror::Error;

/// Result type alias for isolation operations.
pub type IsolationResult<T> = Result<T, IsolationError>;

/// Errors that can occur during quarantine/restore operations.
#[derive(Debug, Error)]
pub enum IsolationError {
    /// Required configuration is missing or invalid. Fatal before any
    /// mutation is attempted.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The configuration field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// A referenced resource (host, interface) does not exist.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// The resource kind (e.g., "host", "interface").
        resource: String,
        /// The resource identifier.
        id: String,
    },

    /// Restore was requested for a host with no recorded snapshot.
    /// Refused by design; restoring never defaults to "open all groups".
    #[error("No prior isolation state recorded for host '{host}'; cannot restore")]
    NoPriorState {
        /// The host identifier.
        host: String,
    },

    /// Transient backend/API failure.
    #[error("Backend operation failed: {operation}: {message}")]
    Backend {
        /// The operation that failed (e.g., "list_interfaces", "set_tags").
        operation: String,
        /// Error message.
        message: String,
    },

    /// A state write would overwrite a snapshot captured by another
    /// in-flight operation. Surfaced as a conflict, never merged.
    #[error("Concurrent isolation state change detected on host '{host}': {message}")]
    ConcurrentModification {
        /// The host identifier.
        host: String,
        /// Conflict details.
        message: String,
    },
}

impl IsolationError {
    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a host-not-found error.
    pub fn host_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "host".to_string(),
            id: id.into(),
        }
    }

    /// Creates an interface-not-found error.
    pub fn interface_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "interface".to_string(),
            id: id.into(),
        }
    }

    /// Creates a no-prior-state error.
    pub fn no_prior_state(host: impl Into<String>) -> Self {
        Self::NoPriorState { host: host.into() }
    }

    /// Creates a backend error.
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a concurrent modification error.
    pub fn concurrent_modification(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConcurrentModification {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed if the operation is re-driven by the operator.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IsolationError::Backend { .. })
    }
}
