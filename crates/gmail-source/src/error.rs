//! Error taxonomy surfaced to the host pipeline

use serde::Serialize;

/// How the host should treat a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// Operator must fix credentials or permissions
    ConfigError,
    /// Unexpected or transient API failure
    SystemError,
}

/// Typed connector failure
///
/// Travels inside `anyhow::Error`; recover it with
/// `err.downcast_ref::<SourceError>()`.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{message}")]
    Config { message: String, internal: String },

    #[error("{message}")]
    System { message: String, internal: String },
}

impl SourceError {
    pub fn config(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn system(message: impl Into<String>, internal: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            internal: internal.into(),
        }
    }

    pub fn failure_type(&self) -> FailureType {
        match self {
            Self::Config { .. } => FailureType::ConfigError,
            Self::System { .. } => FailureType::SystemError,
        }
    }

    /// Operator-facing message
    pub fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } | Self::System { message, .. } => message,
        }
    }

    /// Detail for logs (includes the underlying transport error)
    pub fn internal_message(&self) -> &str {
        match self {
            Self::Config { internal, .. } | Self::System { internal, .. } => internal,
        }
    }
}
