//! Technology keyword table used to route chat messages.
//!
//! An agent is relevant to a message when its name contains a technology
//! key and the message mentions one of that technology's keywords.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "react",
        &["react", "jsx", "tsx", "component", "hook", "usestate", "useeffect", "props", "redux"],
    ),
    (
        "javascript",
        &["javascript", "node", "npm", "typescript", "es6", "promise"],
    ),
    (
        "python",
        &["python", "django", "flask", "fastapi", "pip", "pytest", "pandas"],
    ),
    ("test", &["test", "jest", "pytest", "coverage", "mock", "assert", "fixture"]),
    (
        "security",
        &["security", "vulnerab", "xss", "injection", "csrf", "secret", "password", "cve", "auth"],
    ),
];

/// Technology → lowercase keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordTable {
    technologies: BTreeMap<String, Vec<String>>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordTable {
    pub fn builtin() -> Self {
        Self {
            technologies: BUILTIN
                .iter()
                .map(|(tech, words)| {
                    (
                        tech.to_string(),
                        words.iter().map(|w| w.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            technologies: BTreeMap::new(),
        }
    }

    /// Add keywords to a technology, creating it if needed.
    pub fn extend<I, S>(&mut self, technology: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self
            .technologies
            .entry(technology.to_lowercase())
            .or_default();
        for keyword in keywords {
            let keyword = keyword.as_ref().to_lowercase();
            if !keyword.is_empty() && !entry.contains(&keyword) {
                entry.push(keyword);
            }
        }
    }

    /// Merge another table into this one.
    pub fn merge(&mut self, other: &KeywordTable) {
        for (tech, words) in &other.technologies {
            self.extend(tech, words);
        }
    }

    /// Technologies whose key appears in `agent_name`.
    pub fn technologies_of<'a>(
        &'a self,
        agent_name: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let name = agent_name.to_lowercase();
        self.technologies
            .keys()
            .filter(move |tech| name.contains(tech.as_str()))
            .map(String::as_str)
    }

    /// Whether the message mentions any keyword of `technology`.
    pub fn mentions(&self, technology: &str, message: &str) -> bool {
        let message = message.to_lowercase();
        self.technologies
            .get(technology)
            .map(|words| words.iter().any(|w| message.contains(w.as_str())))
            .unwrap_or(false)
    }

    /// Whether `agent_name` is relevant to `message`.
    pub fn matches(&self, agent_name: &str, message: &str) -> bool {
        self.technologies_of(agent_name)
            .any(|tech| self.mentions(tech, message))
    }

    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technologies_of_agent() {
        let table = KeywordTable::builtin();
        let techs: Vec<&str> = table.technologies_of("javascript_react_test").collect();
        assert_eq!(techs, vec!["javascript", "react", "test"]);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let table = KeywordTable::builtin();
        assert!(table.matches("javascript_react_code", "My useEffect runs TWICE"));
        assert!(!table.matches("python_code", "My useEffect runs twice"));
        assert!(table.matches("security_scanner", "Is this XSS-safe?"));
    }

    #[test]
    fn test_agent_without_technology_never_matches() {
        let table = KeywordTable::builtin();
        assert!(!table.matches("linter", "react python security"));
    }

    #[test]
    fn test_extend_and_merge() {
        let mut table = KeywordTable::empty();
        table.extend("Rust", ["cargo", "Borrow", "cargo"]);
        assert!(table.matches("rust_code", "borrow checker error"));

        let mut builtin = KeywordTable::builtin();
        builtin.merge(&table);
        assert_eq!(builtin.len(), 6);
        assert!(builtin.mentions("rust", "cargo build"));
    }
}
