//! Routes a chat message to the relevant agents and merges their answers.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use arbiter_agents::{
    contract, Agent, AgentContext, AgentError, AgentRegistry, AgentResult, Capability, Category,
    CHAT_TYPE_KEY,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ChatError, ChatResult};
use crate::keywords::KeywordTable;

/// Default per-agent chat deadline.
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Kind of conversation, deciding which categories are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Code,
    Analysis,
    General,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Code => "code",
            ChatType::Analysis => "analysis",
            ChatType::General => "general",
        }
    }

    pub fn categories(&self) -> Vec<Category> {
        match self {
            ChatType::Code => vec![Category::Code],
            ChatType::Analysis => vec![Category::Code, Category::Testing, Category::Security],
            ChatType::General => vec![Category::Code, Category::Testing],
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChatType {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(ChatType::Code),
            "analysis" => Ok(ChatType::Analysis),
            "general" => Ok(ChatType::General),
            _ => Err(ChatError::UnknownChatType(s.to_string())),
        }
    }
}

/// Merged answer of the consulted agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Answers, each under a `## {agent}` header
    pub response: String,
    /// Agents whose chat was invoked, in routing order
    pub agents_used: Vec<String>,
    /// At least one agent answered
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Keyword based chat router.
pub struct ChatRouter {
    registry: Arc<AgentRegistry>,
    keywords: KeywordTable,
    timeout: Duration,
}

impl ChatRouter {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self {
            registry,
            keywords: KeywordTable::builtin(),
            timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Agents that should answer `message`.
    ///
    /// Keyword matches across the target categories, or the first agent of
    /// each target category when nothing matches. The same agent registered
    /// under several categories appears once.
    pub fn route(&self, message: &str, chat_type: ChatType) -> Vec<Arc<dyn Agent>> {
        let categories = chat_type.categories();

        let mut matched: Vec<Arc<dyn Agent>> = Vec::new();
        for category in &categories {
            for agent in self.registry.agents(*category) {
                if self.keywords.matches(agent.name(), message) {
                    push_unique(&mut matched, agent);
                }
            }
        }

        if matched.is_empty() {
            debug!("No keyword match for {} chat, using category defaults", chat_type);
            for category in &categories {
                if let Some(agent) = self.registry.agents(*category).first() {
                    push_unique(&mut matched, agent);
                }
            }
        }

        matched
    }

    /// Ask the routed agents about `message` and merge their answers.
    ///
    /// Agents without chat support are skipped. Other per-agent failures are
    /// collected in [`ChatResponse::errors`].
    pub async fn chat(
        &self,
        message: &str,
        chat_type: ChatType,
        context: Option<AgentContext>,
    ) -> ChatResult<ChatResponse> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let routed = self.route(message, chat_type);
        if routed.is_empty() {
            return Err(ChatError::NoAgents(chat_type.categories()));
        }

        let agents: Vec<Arc<dyn Agent>> = routed
            .into_iter()
            .filter(|agent| {
                let supported = contract::supports(agent.as_ref(), Capability::ChatSupport);
                if !supported {
                    debug!("Agent {} does not support chat, skipping", agent.name());
                }
                supported
            })
            .collect();

        info!("Routing {} chat to {} agents", chat_type, agents.len());

        let context = Arc::new(
            context
                .unwrap_or_default()
                .with_message(message)
                .with_value(CHAT_TYPE_KEY, &chat_type.as_str()),
        );
        let limit = self.timeout;
        let handles: Vec<JoinHandle<AgentResult<String>>> = agents
            .iter()
            .map(|agent| {
                let agent = Arc::clone(agent);
                let context = Arc::clone(&context);
                tokio::spawn(async move {
                    let reply = contract::chat(agent.as_ref(), &context);
                    match tokio::time::timeout(limit, reply).await {
                        Ok(result) => result,
                        Err(_) => Err(AgentError::timeout(agent.name(), limit)),
                    }
                })
            })
            .collect();
        let replies = join_all(handles).await;

        let mut sections = Vec::new();
        let mut errors = Vec::new();
        for (agent, reply) in agents.iter().zip(replies) {
            match reply {
                Ok(Ok(text)) => sections.push(format!("## {}\n{}", agent.name(), text.trim())),
                Ok(Err(e)) if e.is_unsupported() => {
                    debug!("Agent {} declined chat: {}", agent.name(), e);
                }
                Ok(Err(e)) => {
                    warn!("Chat with {} failed: {}", agent.name(), e);
                    errors.push(e.to_string());
                }
                Err(e) => {
                    let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
                    let message = format!("Agent {} {} during chat", agent.name(), reason);
                    warn!("{}", message);
                    errors.push(message);
                }
            }
        }

        Ok(ChatResponse {
            success: !sections.is_empty(),
            response: sections.join("\n\n"),
            agents_used: agents.iter().map(|a| a.name().to_string()).collect(),
            errors,
        })
    }
}

/// Add `agent` unless that same instance is already listed.
fn push_unique(agents: &mut Vec<Arc<dyn Agent>>, agent: &Arc<dyn Agent>) {
    if !agents.iter().any(|a| Arc::ptr_eq(a, agent)) {
        agents.push(Arc::clone(agent));
    }
}
