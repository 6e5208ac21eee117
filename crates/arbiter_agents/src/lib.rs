//! # arbiter_agents
//!
//! Agent contract, registry and built-in analyzers for Arbiter.
//!
//! Agents are pluggable analyzers that:
//! - Declare a closed set of [`Capability`] values
//! - Analyze one file at a time into a [`RawAgentResult`]
//! - Optionally chat, generate tests or suggest optimizations
//!
//! ## Architecture
//!
//! All agents implement the [`Agent`] trait. Optional operations are bound to
//! capabilities and dispatched through [`contract`], so asking an agent for
//! something it never declared fails with
//! [`AgentError::UnsupportedCapability`] instead of doing nothing.
//!
//! Agents are registered per [`Category`] in an [`AgentRegistry`], which is
//! built once and then shared read-only across tasks.
//!
//! ## Built-in agents
//!
//! See [`builtin`]. [`builtin::default_registry`] wires all of them.

pub mod builtin;
pub mod capability;
pub mod contract;
pub mod detect;
pub mod error;
pub mod llm;
pub mod registry;
pub mod stats;
pub mod traits;

pub use capability::{Capability, CapabilitySet, Category};
pub use detect::{HeuristicDetector, TechStack, TechStackDetector};
pub use error::{AgentError, AgentResult};
pub use llm::{ChatMessage, ChatRole, HttpLlmClient, LlmClient, LlmConfig, LlmResponse};
pub use registry::AgentRegistry;
pub use stats::{AgentStats, AgentStatsSnapshot};
pub use traits::{
    Agent, AgentContext, AgentFailure, AgentOutcome, AgentResults, AgentSlot, FailureKind,
    Finding, Issue, RawAgentResult, Severity, Suggestion, CHAT_TYPE_KEY, MESSAGE_KEY,
};
