//! Core agent trait and the records agents exchange with the orchestrator.
//!
//! Agents are pluggable analyzers. The orchestrator only ever talks to them
//! through [`Agent`]; everything it needs back is expressed with the types in
//! this module:
//! - [`Finding`]: a single issue or suggestion
//! - [`RawAgentResult`]: what one successful `analyze` call produced
//! - [`AgentOutcome`]: one result slot, success or recorded failure
//! - [`AgentResults`]: ordered slots keyed by `"{category}_{agent}"`

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::capability::{Capability, CapabilitySet};
use crate::detect::{extension_of, TechStack};
use crate::error::{AgentError, AgentResult};
use crate::stats::AgentStatsSnapshot;

/// Issue severity levels, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Parse a severity label. Anything unrecognised is `Info`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            _ => Severity::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }

    pub fn all() -> [Severity; 5] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ]
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| Severity::parse(&s)).unwrap_or_default())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// A flat issue or suggestion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Finding type, e.g. `"style"`, `"security"`, `"vulnerability"`
    #[serde(rename = "type")]
    pub finding_type: String,
    #[serde(default)]
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Name of the agent that produced this finding
    #[serde(default)]
    pub source_agent: String,
    #[serde(default = "default_confidence")]
    pub confidence_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_text: Option<String>,
}

/// Issues and suggestions share one shape.
pub type Issue = Finding;
pub type Suggestion = Finding;

impl Finding {
    pub fn new(
        finding_type: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
    ) -> Self {
        Self {
            finding_type: finding_type.into(),
            severity,
            title: title.into(),
            description: String::new(),
            source_agent: String::new(),
            confidence_score: default_confidence(),
            line_number: None,
            suggestion_text: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn from_agent(mut self, agent: impl Into<String>) -> Self {
        self.source_agent = agent.into();
        self
    }

    pub fn with_confidence(mut self, score: f32) -> Self {
        self.confidence_score = score.clamp(0.0, 1.0);
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }

    pub fn with_suggestion(mut self, text: impl Into<String>) -> Self {
        self.suggestion_text = Some(text.into());
        self
    }
}

/// Output of one successful `analyze` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAgentResult {
    pub agent: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Agent-specific numbers (line counts, rule hits, ...)
    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,
}

impl RawAgentResult {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            ..Self::default()
        }
    }

    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_metric<T: Serialize>(mut self, key: impl Into<String>, value: &T) -> Self {
        if let Ok(json) = serde_json::to_value(value) {
            self.metrics.insert(key.into(), json);
        }
        self
    }
}

/// Why a slot holds a failure instead of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Execution,
    Unsupported,
    Panicked,
}

/// A recorded per-agent failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub error: String,
    pub kind: FailureKind,
}

impl AgentFailure {
    pub fn new(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind,
        }
    }
}

impl From<AgentError> for AgentFailure {
    fn from(err: AgentError) -> Self {
        let kind = match &err {
            AgentError::Timeout { .. } => FailureKind::Timeout,
            AgentError::UnsupportedCapability { .. } => FailureKind::Unsupported,
            _ => FailureKind::Execution,
        };
        Self::new(kind, err.to_string())
    }
}

/// Content of a single result slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentOutcome {
    Failure(AgentFailure),
    Success(RawAgentResult),
}

impl AgentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Success(_))
    }

    pub fn result(&self) -> Option<&RawAgentResult> {
        match self {
            AgentOutcome::Success(result) => Some(result),
            AgentOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            AgentOutcome::Failure(failure) => Some(&failure.error),
            AgentOutcome::Success(_) => None,
        }
    }
}

impl From<AgentResult<RawAgentResult>> for AgentOutcome {
    fn from(result: AgentResult<RawAgentResult>) -> Self {
        match result {
            Ok(raw) => AgentOutcome::Success(raw),
            Err(err) => AgentOutcome::Failure(err.into()),
        }
    }
}

/// One keyed result slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSlot {
    pub key: String,
    pub outcome: AgentOutcome,
}

/// Result slots in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentResults {
    slots: Vec<AgentSlot>,
}

impl AgentResults {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert a slot. An existing key keeps its position and gets the new outcome.
    pub fn insert(&mut self, key: impl Into<String>, outcome: AgentOutcome) {
        let key = key.into();
        match self.slots.iter_mut().find(|s| s.key == key) {
            Some(slot) => slot.outcome = outcome,
            None => self.slots.push(AgentSlot { key, outcome }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&AgentOutcome> {
        self.slots.iter().find(|s| s.key == key).map(|s| &s.outcome)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentSlot> {
        self.slots.iter()
    }

    /// Successful slots only, in order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &RawAgentResult)> {
        self.slots
            .iter()
            .filter_map(|s| s.outcome.result().map(|r| (s.key.as_str(), r)))
    }

    /// Failed slots only, in order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots
            .iter()
            .filter_map(|s| s.outcome.error().map(|e| (s.key.as_str(), e)))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<'a> IntoIterator for &'a AgentResults {
    type Item = &'a AgentSlot;
    type IntoIter = std::slice::Iter<'a, AgentSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Context key carrying the chat message.
pub const MESSAGE_KEY: &str = "message";
/// Context key carrying the chat type.
pub const CHAT_TYPE_KEY: &str = "chat_type";

/// Context handed to every agent call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentContext {
    /// Caller-supplied values
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
    /// Results of agents that ran earlier in a sequential pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_results: Option<AgentResults>,
    /// Stack detected for the file under analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<TechStack>,
}

impl AgentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.values.insert(key.into(), json);
        }
    }

    pub fn with_value<T: Serialize>(mut self, key: impl Into<String>, value: &T) -> Self {
        self.set(key, value);
        self
    }

    /// Get a value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn with_message(self, message: impl Into<String>) -> Self {
        let message: String = message.into();
        self.with_value(MESSAGE_KEY, &message)
    }

    pub fn message(&self) -> Option<&str> {
        self.get_str(MESSAGE_KEY)
    }

    pub fn with_previous_results(mut self, results: AgentResults) -> Self {
        self.previous_results = Some(results);
        self
    }

    pub fn with_tech_stack(mut self, stack: TechStack) -> Self {
        self.tech_stack = Some(stack);
        self
    }
}

/// Core trait for all agents.
///
/// `analyze` is mandatory. `chat`, `generate_tests` and `optimize` are bound
/// to the [`Capability::ChatSupport`], [`Capability::TestGeneration`] and
/// [`Capability::CodeOptimization`] capabilities; an agent declaring one of
/// those must override the matching method. The default bodies fail with
/// [`AgentError::UnsupportedCapability`]. Callers should go through
/// [`crate::contract`], which checks the declared set before dispatching.
///
/// Agents are invoked concurrently from several tasks, so any internal state
/// (stats counters included) must be thread-safe.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Name, unique within a category.
    fn name(&self) -> &str;

    fn version(&self) -> &str {
        "1.0.0"
    }

    /// Declared capability set.
    fn capabilities(&self) -> CapabilitySet;

    /// File extensions this agent understands (without the dot).
    fn supported_extensions(&self) -> &[&'static str] {
        &[]
    }

    fn supported_frameworks(&self) -> &[&'static str] {
        &[]
    }

    /// Check whether the agent can handle this input.
    fn validate(&self, path: &str, content: &str) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let extensions = self.supported_extensions();
        extensions.is_empty()
            || extension_of(path)
                .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false)
    }

    /// Analyze a file.
    async fn analyze(
        &self,
        path: &str,
        content: &str,
        context: &AgentContext,
    ) -> AgentResult<RawAgentResult>;

    async fn chat(&self, _context: &AgentContext) -> AgentResult<String> {
        Err(AgentError::unsupported(self.name(), Capability::ChatSupport))
    }

    async fn generate_tests(
        &self,
        _path: &str,
        _content: &str,
        _context: &AgentContext,
    ) -> AgentResult<String> {
        Err(AgentError::unsupported(self.name(), Capability::TestGeneration))
    }

    async fn optimize(
        &self,
        _path: &str,
        _content: &str,
        _context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        Err(AgentError::unsupported(self.name(), Capability::CodeOptimization))
    }

    /// Self-reported usage counters.
    fn stats(&self) -> AgentStatsSnapshot {
        AgentStatsSnapshot::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_falls_back_to_info() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" critical "), Severity::Critical);
        assert_eq!(Severity::parse(""), Severity::Info);
        assert_eq!(Severity::parse("blocker"), Severity::Info);
        assert!(Severity::Critical > Severity::High);
    }

    #[test]
    fn test_finding_deserialize_tolerates_bad_severity() {
        let json = r#"[
            {"type": "style", "severity": "HIGH", "title": "a"},
            {"type": "style", "severity": "", "title": "b"},
            {"type": "style", "severity": null, "title": "c"},
            {"type": "style", "title": "d"}
        ]"#;
        let findings: Vec<Finding> = serde_json::from_str(json).unwrap();
        let severities: Vec<Severity> = findings.iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::Info, Severity::Info, Severity::Info]
        );
        assert_eq!(findings[0].confidence_score, 1.0);
    }

    #[test]
    fn test_finding_serializes_type_key() {
        let finding = Finding::new("vulnerability", Severity::Low, "eval usage")
            .from_agent("security_scanner")
            .at_line(3);
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["type"], "vulnerability");
        assert_eq!(json["severity"], "low");
        assert_eq!(json["line_number"], 3);
        assert!(json.get("suggestion_text").is_none());
    }

    #[test]
    fn test_outcome_failure_has_error_key() {
        let outcome = AgentOutcome::from(Err(AgentError::timeout(
            "slow",
            std::time::Duration::from_secs(1),
        )));
        assert_eq!(outcome.error(), Some("Agent slow timed out after 1s"));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["error"], "Agent slow timed out after 1s");
        assert_eq!(json["kind"], "timeout");

        let back: AgentOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn test_agent_results_keep_insertion_order() {
        let mut results = AgentResults::new();
        results.insert("testing_b", AgentOutcome::Success(RawAgentResult::new("b")));
        results.insert("code_a", AgentOutcome::Success(RawAgentResult::new("a")));
        results.insert(
            "testing_b",
            AgentOutcome::Failure(AgentFailure::new(FailureKind::Execution, "boom")),
        );

        let keys: Vec<&str> = results.keys().collect();
        assert_eq!(keys, vec!["testing_b", "code_a"]);
        assert_eq!(results.successes().count(), 1);
        assert_eq!(results.failures().next(), Some(("testing_b", "boom")));
    }

    #[test]
    fn test_agent_context_values() {
        let ctx = AgentContext::new()
            .with_message("how do I use useEffect?")
            .with_value("strict", &true);

        assert_eq!(ctx.message(), Some("how do I use useEffect?"));
        assert_eq!(ctx.get::<bool>("strict"), Some(true));
        assert!(ctx.previous_results.is_none());
    }
}
