//! Error types for chat routing.

use std::fmt;

use arbiter_agents::Category;

/// Chat routing errors
#[derive(Debug)]
pub enum ChatError {
    /// Chat type is not one of code, analysis, general
    UnknownChatType(String),
    /// Message is empty or whitespace
    EmptyMessage,
    /// No agent is registered in any target category
    NoAgents(Vec<Category>),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChatType(name) => write!(
                f,
                "Unknown chat type: {} (expected code, analysis or general)",
                name
            ),
            Self::EmptyMessage => write!(f, "Chat message is empty"),
            Self::NoAgents(categories) => {
                let names: Vec<&str> = categories.iter().map(|c| c.as_str()).collect();
                write!(f, "No agents registered for: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for ChatError {}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
