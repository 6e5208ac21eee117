//! Merged report produced by the aggregator.

use std::collections::BTreeMap;

use arbiter_agents::{AgentResults, Issue, RawAgentResult, Severity, Suggestion};
use serde::{Deserialize, Serialize};

/// Category-scoped view: slot key → successful result.
pub type CategoryView = BTreeMap<String, RawAgentResult>;

/// One schema for the output of every agent of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    /// Issues of all successful slots, in slot order
    pub issues: Vec<Issue>,
    /// Suggestions of all successful slots, in slot order
    pub suggestions: Vec<Suggestion>,
    /// Every slot, including failures
    pub agent_results: AgentResults,
    pub code_analysis: CategoryView,
    pub test_results: CategoryView,
    pub security_findings: CategoryView,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AggregatedReport {
    /// Number of issues with exactly this severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Issue counts for every severity, including zeroes.
    pub fn severity_counts(&self) -> BTreeMap<String, usize> {
        Severity::all()
            .into_iter()
            .map(|s| (s.as_str().to_string(), self.count_severity(s)))
            .collect()
    }

    /// Issues whose type is one of `types`.
    pub fn issues_of_type<'a>(
        &'a self,
        types: &'a [String],
    ) -> impl Iterator<Item = &'a Issue> + 'a {
        self.issues
            .iter()
            .filter(move |i| types.iter().any(|t| *t == i.finding_type))
    }

    /// Error recorded for a failed slot.
    pub fn agent_error(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(&format!("{}_error", key))
            .and_then(|v| v.as_str())
    }
}
