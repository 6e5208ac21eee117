//! Agent registry: category → agent name → agent.
//!
//! Populated at startup and shared read-only (`Arc<AgentRegistry>`) after
//! that, so lookups need no locking. Registration order inside a category is
//! preserved; selection falls back to the first registered agent.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::capability::Category;
use crate::error::{AgentError, AgentResult};
use crate::traits::Agent;

/// Two-level registry of agents.
#[derive(Default)]
pub struct AgentRegistry {
    categories: HashMap<Category, Vec<Arc<dyn Agent>>>,
}

impl AgentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            categories: HashMap::new(),
        }
    }

    /// Register an agent under a category.
    ///
    /// An agent with the same name in the same category is replaced in place,
    /// keeping its registration position.
    pub fn register(&mut self, category: Category, agent: Arc<dyn Agent>) {
        debug!("Registering agent {} under {}", agent.name(), category);
        let agents = self.categories.entry(category).or_default();
        match agents.iter_mut().find(|a| a.name() == agent.name()) {
            Some(existing) => *existing = agent,
            None => agents.push(agent),
        }
    }

    /// Builder-style registration.
    pub fn with(mut self, category: Category, agent: Arc<dyn Agent>) -> Self {
        self.register(category, agent);
        self
    }

    /// Get an agent by category and name.
    pub fn get(&self, category: Category, name: &str) -> Option<Arc<dyn Agent>> {
        self.categories
            .get(&category)?
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    /// Get an agent, returning an error if not found.
    pub fn get_required(&self, category: Category, name: &str) -> AgentResult<Arc<dyn Agent>> {
        self.get(category, name)
            .ok_or_else(|| AgentError::NotFound(format!("{}/{}", category, name)))
    }

    /// Agents of a category in registration order.
    pub fn agents(&self, category: Category) -> &[Arc<dyn Agent>] {
        self.categories
            .get(&category)
            .map(|a| a.as_slice())
            .unwrap_or(&[])
    }

    /// First agent registered in a category.
    pub fn first(&self, category: Category) -> Option<Arc<dyn Agent>> {
        self.agents(category).first().cloned()
    }

    /// Agent names of a category in registration order.
    pub fn names(&self, category: Category) -> Vec<&str> {
        self.agents(category).iter().map(|a| a.name()).collect()
    }

    /// Categories that have at least one agent.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .categories
            .iter()
            .filter(|(_, agents)| !agents.is_empty())
            .map(|(c, _)| *c)
            .collect();
        categories.sort();
        categories
    }

    /// Total number of registrations across categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(|a| a.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for category in self.categories() {
            map.entry(&category, &self.names(category));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Capability, CapabilitySet};
    use crate::error::AgentResult;
    use crate::traits::{AgentContext, RawAgentResult};
    use async_trait::async_trait;

    struct NamedAgent {
        name: String,
        version: &'static str,
    }

    fn agent(name: &str) -> Arc<dyn Agent> {
        Arc::new(NamedAgent {
            name: name.to_string(),
            version: "1.0.0",
        })
    }

    #[async_trait]
    impl Agent for NamedAgent {
        fn name(&self) -> &str {
            &self.name
        }

        fn version(&self) -> &str {
            self.version
        }

        fn capabilities(&self) -> CapabilitySet {
            CapabilitySet::from([Capability::CodeAnalysis])
        }

        async fn analyze(
            &self,
            _path: &str,
            _content: &str,
            _context: &AgentContext,
        ) -> AgentResult<RawAgentResult> {
            Ok(RawAgentResult::new(&self.name))
        }
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = AgentRegistry::new()
            .with(Category::Code, agent("python_code"))
            .with(Category::Code, agent("javascript_react_code"))
            .with(Category::Testing, agent("python_test"));

        assert_eq!(
            registry.names(Category::Code),
            vec!["python_code", "javascript_react_code"]
        );
        assert_eq!(registry.first(Category::Code).unwrap().name(), "python_code");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.categories(), vec![Category::Code, Category::Testing]);
    }

    #[test]
    fn test_same_name_replaces_in_place() {
        let mut registry = AgentRegistry::new()
            .with(Category::Code, agent("a"))
            .with(Category::Code, agent("b"));
        registry.register(
            Category::Code,
            Arc::new(NamedAgent {
                name: "a".to_string(),
                version: "2.0.0",
            }),
        );

        assert_eq!(registry.names(Category::Code), vec!["a", "b"]);
        assert_eq!(registry.get(Category::Code, "a").unwrap().version(), "2.0.0");
    }

    #[test]
    fn test_same_agent_in_two_categories() {
        let shared = agent("security_scanner");
        let registry = AgentRegistry::new()
            .with(Category::Security, Arc::clone(&shared))
            .with(Category::Code, shared);

        assert!(registry.get(Category::Security, "security_scanner").is_some());
        assert!(registry.get(Category::Code, "security_scanner").is_some());
        assert!(registry.get_required(Category::Testing, "security_scanner").is_err());
        assert!(registry.agents(Category::Testing).is_empty());
    }
}
