//! Error types for queue operations.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// Configuration faults are the only class allowed to terminate the
/// process; they surface at startup and are never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing required configuration section: {section}")]
    Missing { section: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    #[error("configuration parsing failed: {message}")]
    Parsing { message: String },
}

/// Errors surfaced by queue client operations
#[derive(Debug, Error)]
pub enum SqsError {
    #[error("invalid argument: {argument} must not be empty")]
    InvalidArgument { argument: &'static str },

    #[error("{operation} failed for queue '{queue_name}': {message}")]
    Transport {
        operation: &'static str,
        queue_name: String,
        message: String,
        status: Option<u16>,
    },

    #[error("{operation} cancelled for queue '{queue_name}'")]
    Cancelled {
        operation: &'static str,
        queue_name: String,
    },

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl SqsError {
    /// Check if the error is worth retrying on a later iteration
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } => false,
            Self::Transport { .. } => true,
            Self::Cancelled { .. } => false,
            Self::Configuration(_) => false,
        }
    }
}

/// Routing outcomes that are faults: no claimant, or more than one.
///
/// Both leave the affected message undeleted so the queue's own
/// redelivery policy applies.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("no processor registered for message type '{message_type}'")]
    HandlerNotFound { message_type: String },

    #[error("multiple processors registered for message type '{message_type}'")]
    AmbiguousHandler { message_type: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
