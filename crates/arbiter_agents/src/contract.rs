//! Capability-checked dispatch of optional agent operations.
//!
//! Each helper checks the agent's declared [`CapabilitySet`] first and fails
//! with [`AgentError::UnsupportedCapability`] when the capability is absent,
//! without calling into the agent at all.
//!
//! [`CapabilitySet`]: crate::capability::CapabilitySet

use crate::capability::Capability;
use crate::error::{AgentError, AgentResult};
use crate::traits::{Agent, AgentContext, RawAgentResult};

/// Fail unless `agent` declares `capability`.
pub fn require(agent: &dyn Agent, capability: Capability) -> AgentResult<()> {
    if agent.capabilities().contains(capability) {
        Ok(())
    } else {
        Err(AgentError::unsupported(agent.name(), capability))
    }
}

pub fn supports(agent: &dyn Agent, capability: Capability) -> bool {
    agent.capabilities().contains(capability)
}

/// Chat with an agent that declares [`Capability::ChatSupport`].
pub async fn chat(agent: &dyn Agent, context: &AgentContext) -> AgentResult<String> {
    require(agent, Capability::ChatSupport)?;
    agent.chat(context).await
}

/// Generate tests with an agent that declares [`Capability::TestGeneration`].
pub async fn generate_tests(
    agent: &dyn Agent,
    path: &str,
    content: &str,
    context: &AgentContext,
) -> AgentResult<String> {
    require(agent, Capability::TestGeneration)?;
    agent.generate_tests(path, content, context).await
}

/// Optimize with an agent that declares [`Capability::CodeOptimization`].
pub async fn optimize(
    agent: &dyn Agent,
    path: &str,
    content: &str,
    context: &AgentContext,
) -> AgentResult<RawAgentResult> {
    require(agent, Capability::CodeOptimization)?;
    agent.optimize(path, content, context).await
}
