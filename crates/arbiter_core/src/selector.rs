//! Agent selection for a workflow.
//!
//! For each category of the template (required first) one agent is picked:
//!
//! 1. exact match: name contains both the detected language and framework
//! 2. language match: name contains the detected language
//! 3. fallback: first agent registered in the category
//!
//! Matching is a case-insensitive substring test on the agent name.

use std::sync::Arc;

use arbiter_agents::{Agent, AgentRegistry, Category, TechStack};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::template::WorkflowTemplate;

/// Result slot key for an agent.
pub fn agent_key(category: Category, agent_name: &str) -> String {
    format!("{}_{}", category.as_str(), agent_name)
}

/// How an agent was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Language,
    Fallback,
}

/// One selected agent.
#[derive(Clone)]
pub struct SelectedAgent {
    pub key: String,
    pub category: Category,
    pub required: bool,
    pub match_kind: MatchKind,
    pub agent: Arc<dyn Agent>,
}

impl std::fmt::Debug for SelectedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedAgent")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("required", &self.required)
            .field("match_kind", &self.match_kind)
            .finish()
    }
}

/// Ordered selection.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    agents: Vec<SelectedAgent>,
}

impl Selection {
    pub fn iter(&self) -> std::slice::Iter<'_, SelectedAgent> {
        self.agents.iter()
    }

    pub fn keys(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.key.clone()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&SelectedAgent> {
        self.agents.iter().find(|a| a.key == key)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a SelectedAgent;
    type IntoIter = std::slice::Iter<'a, SelectedAgent>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}

/// Picks agents from a registry.
#[derive(Debug, Default, Clone)]
pub struct AgentSelector;

impl AgentSelector {
    pub fn new() -> Self {
        Self
    }

    /// Select one agent per template category.
    ///
    /// Fails with [`CoreError::NoSuitableAgent`] when a required category has
    /// no registered agent. Empty optional categories are skipped.
    pub fn select(
        &self,
        template: &WorkflowTemplate,
        stack: &TechStack,
        registry: &AgentRegistry,
    ) -> CoreResult<Selection> {
        let mut selection = Selection::default();

        for (category, required) in template.categories() {
            let Some((agent, match_kind)) = Self::pick(registry.agents(category), stack) else {
                if required {
                    return Err(CoreError::NoSuitableAgent(category));
                }
                debug!("No agent registered for optional category {}, skipping", category);
                continue;
            };

            let key = agent_key(category, agent.name());
            debug!("Selected {} ({:?} match, required={})", key, match_kind, required);
            selection.agents.push(SelectedAgent {
                key,
                category,
                required,
                match_kind,
                agent,
            });
        }

        Ok(selection)
    }

    fn pick(agents: &[Arc<dyn Agent>], stack: &TechStack) -> Option<(Arc<dyn Agent>, MatchKind)> {
        let language = stack.language.as_deref().map(str::to_lowercase);
        let framework = stack.framework.as_deref().map(str::to_lowercase);
        let name_has = |name: &str, needle: &str| name.to_lowercase().contains(needle);

        if let (Some(language), Some(framework)) = (&language, &framework) {
            if let Some(agent) = agents
                .iter()
                .find(|a| {
                    name_has(a.name(), language.as_str()) && name_has(a.name(), framework.as_str())
                })
            {
                return Some((Arc::clone(agent), MatchKind::Exact));
            }
        }

        if let Some(language) = &language {
            if let Some(agent) = agents.iter().find(|a| name_has(a.name(), language.as_str())) {
                return Some((Arc::clone(agent), MatchKind::Language));
            }
        }

        agents.first().map(|a| (Arc::clone(a), MatchKind::Fallback))
    }
}
