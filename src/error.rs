//! Error types for the trigger matrix, context transforms and orchestrator.

use thiserror::Error;

/// Errors produced anywhere in the context core.
///
/// Every failure is returned to the caller; nothing is retried or swallowed
/// inside the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// The vector or trigger is incomplete; no handler was invoked.
    #[error("Validation failed: missing {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// No handler is registered for the trigger type.
    #[error("No handler registered for trigger type '{trigger_type}'")]
    NoHandler { trigger_type: String },

    /// A required payload field is absent.
    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    /// A payload field is present but has the wrong shape.
    #[error("Field '{field}' must be {expected}")]
    InvalidField { field: String, expected: String },

    /// Unknown context id.
    #[error("Context not found: {context_id}")]
    NotFound { context_id: String },

    /// The compression transform produced an unusable number.
    #[error("Compression computation error: {message}")]
    Computation { message: String },

    /// A persistence backend rejected an operation.
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// A signer could not be built.
    #[error("Signing error: {message}")]
    Signing { message: String },

    /// Free-form failure raised by an externally registered handler.
    #[error("Handler error: {message}")]
    Handler { message: String },
}

impl ContextError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// True for errors raised before any handler ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ContextError>;
