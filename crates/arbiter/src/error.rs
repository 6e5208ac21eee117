//! Error types for the orchestrator facade.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for facade operations.
pub type ArbiterResult<T> = Result<T, ArbiterError>;

/// Errors surfaced by [`crate::Orchestrator`] and config loading.
///
/// Per-agent failures during a workflow are not errors; they are recorded in
/// the [`crate::WorkflowResult`].
#[derive(Error, Debug)]
pub enum ArbiterError {
    #[error(transparent)]
    Core(#[from] arbiter_core::CoreError),

    #[error(transparent)]
    Policy(#[from] arbiter_policy::PolicyError),

    #[error(transparent)]
    Chat(#[from] arbiter_chat::ChatError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported config format: {0} (expected .yaml, .yml or .toml)")]
    UnsupportedConfigFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
