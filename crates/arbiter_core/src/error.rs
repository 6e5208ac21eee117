//! Error types for the core module.

use arbiter_agents::Category;
use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that abort a workflow before any agent runs.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No suitable agent registered for required category: {0}")]
    NoSuitableAgent(Category),

    #[error("Workflow template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unknown workflow type: {0}")]
    UnknownWorkflow(String),

    #[error("Invalid workflow template {name}: {message}")]
    InvalidTemplate { name: String, message: String },
}

impl CoreError {
    pub fn invalid_template(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            name: name.into(),
            message: message.into(),
        }
    }
}
