//! Error types for agents module.

use thiserror::Error;

use crate::capability::Capability;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur during agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent {agent} does not support {capability}")]
    UnsupportedCapability {
        agent: String,
        capability: Capability,
    },

    #[error("Agent execution failed: {agent} - {message}")]
    ExecutionFailed { agent: String, message: String },

    #[error("Invalid input for agent {agent}: {message}")]
    InvalidInput { agent: String, message: String },

    #[error("Agent {agent} timed out after {seconds}s")]
    Timeout { agent: String, seconds: f64 },

    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AgentError {
    /// Create an unsupported capability error.
    pub fn unsupported(agent: impl Into<String>, capability: Capability) -> Self {
        Self::UnsupportedCapability {
            agent: agent.into(),
            capability,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Create an execution failed error.
    pub fn execution_failed(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            agent: agent.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(agent: impl Into<String>, limit: std::time::Duration) -> Self {
        Self::Timeout {
            agent: agent.into(),
            seconds: limit.as_secs_f64(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedCapability { .. })
    }
}
