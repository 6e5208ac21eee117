//! Error types for policy module.

use thiserror::Error;

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur while configuring gates.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Invalid gate configuration: {gate} - {message}")]
    InvalidConfiguration { gate: String, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PolicyError {
    pub fn invalid(gate: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            gate: gate.into(),
            message: message.into(),
        }
    }
}
