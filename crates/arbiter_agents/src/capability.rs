//! Agent categories and capabilities.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Top-level grouping agents are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Code,
    Testing,
    Security,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Code => "code",
            Category::Testing => "testing",
            Category::Security => "security",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![Category::Code, Category::Testing, Category::Security]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "code" => Ok(Category::Code),
            "testing" | "test" => Ok(Category::Testing),
            "security" => Ok(Category::Security),
            other => Err(AgentError::NotFound(format!("category '{}'", other))),
        }
    }
}

/// Closed set of things an agent can declare it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CodeAnalysis,
    TestGeneration,
    CodeOptimization,
    SecurityAnalysis,
    PerformanceAnalysis,
    StyleCheck,
    DocGeneration,
    Refactoring,
    DependencyAnalysis,
    ChatSupport,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CodeAnalysis => "code_analysis",
            Capability::TestGeneration => "test_generation",
            Capability::CodeOptimization => "code_optimization",
            Capability::SecurityAnalysis => "security_analysis",
            Capability::PerformanceAnalysis => "performance_analysis",
            Capability::StyleCheck => "style_check",
            Capability::DocGeneration => "doc_generation",
            Capability::Refactoring => "refactoring",
            Capability::DependencyAnalysis => "dependency_analysis",
            Capability::ChatSupport => "chat_support",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared capabilities of an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(caps: [Capability; N]) -> Self {
        caps.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in Category::all() {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("TEST".parse::<Category>().unwrap(), Category::Testing);
        assert!("frontend".parse::<Category>().is_err());
    }

    #[test]
    fn test_capability_set() {
        let caps = CapabilitySet::from([Capability::CodeAnalysis, Capability::ChatSupport]);
        assert!(caps.contains(Capability::ChatSupport));
        assert!(!caps.contains(Capability::TestGeneration));
        assert_eq!(caps.len(), 2);

        let caps = caps.with(Capability::ChatSupport);
        assert_eq!(caps.len(), 2);
    }
}
