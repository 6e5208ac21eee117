//! Built-in agents.
//!
//! | Agent | Category | Focus |
//! |-------|----------|-------|
//! | [`ReactCodeAgent`] | code | React/JSX style, hooks, rendering |
//! | [`PythonCodeAgent`] | code | Python style and common bugs |
//! | [`ReactTestAgent`] | testing | Jest/RTL test quality and generation |
//! | [`PythonTestAgent`] | testing | pytest quality and generation |
//! | [`SecurityScannerAgent`] | security | Injection, secrets, dependencies |
//!
//! All of them are rule based. An optional [`LlmClient`] only powers `chat`.

mod python;
mod react;
mod rules;
mod security;

use std::sync::Arc;

use crate::capability::Category;
use crate::error::{AgentError, AgentResult};
use crate::llm::{ChatMessage, LlmClient};
use crate::registry::AgentRegistry;
use crate::stats::AgentStats;
use crate::traits::{AgentContext, RawAgentResult};

pub use python::{PythonCodeAgent, PythonTestAgent};
pub use react::{ReactCodeAgent, ReactTestAgent};
pub use security::SecurityScannerAgent;

/// Context key holding prior chat turns as `Vec<ChatMessage>`.
pub const HISTORY_KEY: &str = "history";

/// Registry with every built-in agent.
pub fn default_registry(llm: Option<Arc<dyn LlmClient>>) -> AgentRegistry {
    AgentRegistry::new()
        .with(Category::Code, Arc::new(ReactCodeAgent::new(llm.clone())))
        .with(Category::Code, Arc::new(PythonCodeAgent::new(llm.clone())))
        .with(Category::Testing, Arc::new(ReactTestAgent::new(llm.clone())))
        .with(Category::Testing, Arc::new(PythonTestAgent::new(llm.clone())))
        .with(Category::Security, Arc::new(SecurityScannerAgent::new(llm)))
}

/// State every built-in agent carries.
pub(crate) struct AgentBase {
    name: &'static str,
    system_prompt: &'static str,
    llm: Option<Arc<dyn LlmClient>>,
    stats: AgentStats,
}

impl AgentBase {
    pub fn new(
        name: &'static str,
        system_prompt: &'static str,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        Self {
            name,
            system_prompt,
            llm,
            stats: AgentStats::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    /// Reject input the agent cannot handle.
    pub fn check_input(&self, valid: bool, path: &str) -> AgentResult<()> {
        if valid {
            Ok(())
        } else {
            self.stats.record_failure();
            Err(AgentError::invalid_input(
                self.name,
                format!("unsupported or empty input: {}", path),
            ))
        }
    }

    /// Record a finished analysis.
    pub fn finish(&self, result: RawAgentResult) -> RawAgentResult {
        self.stats.record_analysis(result.issues.len());
        result
    }

    /// Answer a chat message via the LLM, or with `fallback` without one.
    pub async fn chat(&self, context: &AgentContext, fallback: &str) -> AgentResult<String> {
        let message = context
            .message()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AgentError::invalid_input(self.name, "chat requires a message"))?;

        self.stats.record_chat();

        if let Some(llm) = &self.llm {
            let mut history = vec![ChatMessage::system(self.system_prompt)];
            history.extend(context.get::<Vec<ChatMessage>>(HISTORY_KEY).unwrap_or_default());
            if let Some(text) = llm.generate(message, &history).await.into_text() {
                return Ok(text);
            }
        }
        Ok(fallback.to_string())
    }
}

/// Public, non-underscore names captured by `pattern`'s first group.
pub(crate) fn captured_names(pattern: &regex::Regex, content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in pattern.captures_iter(content) {
        if let Some(name) = caps.get(1).map(|m| m.as_str()) {
            if !name.starts_with('_') && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Severity counts of issues found by earlier pipeline stages.
pub(crate) fn upstream_high_findings(context: &AgentContext) -> Vec<(String, usize)> {
    let Some(previous) = &context.previous_results else {
        return Vec::new();
    };
    previous
        .successes()
        .map(|(key, result)| {
            let count = result
                .issues
                .iter()
                .filter(|i| i.severity >= crate::traits::Severity::High)
                .count();
            (key.to_string(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlmClient};

    #[test]
    fn test_default_registry_layout() {
        let registry = default_registry(None);
        assert_eq!(
            registry.names(Category::Code),
            vec!["javascript_react_code", "python_code"]
        );
        assert_eq!(
            registry.names(Category::Testing),
            vec!["javascript_react_test", "python_test"]
        );
        assert_eq!(registry.names(Category::Security), vec!["security_scanner"]);
    }

    #[tokio::test]
    async fn test_chat_uses_llm_with_system_prompt() {
        let mut llm = MockLlmClient::new();
        llm.expect_generate()
            .withf(|prompt, history| {
                prompt == "why?" && history.len() == 1 && history[0].content == "be brief"
            })
            .times(1)
            .returning(|_, _| LlmResponse::ok("because"));

        let base = AgentBase::new("demo", "be brief", Some(Arc::new(llm)));
        let reply = base
            .chat(&AgentContext::new().with_message("why?"), "fallback")
            .await
            .unwrap();

        assert_eq!(reply, "because");
        assert_eq!(base.stats().snapshot().chats, 1);
    }

    #[tokio::test]
    async fn test_chat_falls_back_when_llm_fails() {
        let mut llm = MockLlmClient::new();
        llm.expect_generate()
            .returning(|_, _| LlmResponse::failed("503"));

        let base = AgentBase::new("demo", "prompt", Some(Arc::new(llm)));
        let reply = base
            .chat(&AgentContext::new().with_message("hello"), "canned")
            .await
            .unwrap();
        assert_eq!(reply, "canned");
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let base = AgentBase::new("demo", "prompt", None);
        let err = base.chat(&AgentContext::new(), "canned").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput { .. }));
    }
}
