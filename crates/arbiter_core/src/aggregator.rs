//! Merge per-agent results into one [`AggregatedReport`].
//!
//! Issues and suggestions are concatenated in slot order and never
//! de-duplicated: two agents flagging the same line produce two issues.

use arbiter_agents::{AgentOutcome, AgentResults};
use serde_json::json;
use tracing::debug;

use crate::report::AggregatedReport;

/// Stateless result merger.
#[derive(Debug, Default, Clone)]
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn combine(&self, results: &AgentResults) -> AggregatedReport {
        let mut report = AggregatedReport {
            agent_results: results.clone(),
            ..AggregatedReport::default()
        };

        let mut successful = 0usize;
        for slot in results {
            match &slot.outcome {
                AgentOutcome::Failure(failure) => {
                    report
                        .metadata
                        .insert(format!("{}_error", slot.key), json!(failure.error));
                }
                AgentOutcome::Success(result) => {
                    successful += 1;
                    report.issues.extend(result.issues.iter().cloned());
                    report.suggestions.extend(result.suggestions.iter().cloned());

                    if slot.key.contains("code") {
                        report.code_analysis.insert(slot.key.clone(), result.clone());
                    }
                    if slot.key.contains("test") {
                        report.test_results.insert(slot.key.clone(), result.clone());
                    }
                    if slot.key.contains("security") {
                        report.security_findings.insert(slot.key.clone(), result.clone());
                    }
                }
            }
        }

        let severity_counts = report.severity_counts();
        report.metadata.insert("total_agents".into(), json!(results.len()));
        report.metadata.insert("successful_agents".into(), json!(successful));
        report
            .metadata
            .insert("failed_agents".into(), json!(results.len() - successful));
        report.metadata.insert("total_issues".into(), json!(report.issues.len()));
        report
            .metadata
            .insert("total_suggestions".into(), json!(report.suggestions.len()));
        report.metadata.insert("severity_counts".into(), json!(severity_counts));

        debug!(
            "Aggregated {} slots: {} issues, {} suggestions",
            results.len(),
            report.issues.len(),
            report.suggestions.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_agents::{AgentFailure, FailureKind, Finding, RawAgentResult, Severity};

    fn issue(title: &str, severity: Severity) -> Finding {
        Finding::new("style", severity, title)
    }

    fn results() -> AgentResults {
        let mut results = AgentResults::new();
        results.insert(
            "code_python_code",
            AgentOutcome::Success(
                RawAgentResult::new("python_code")
                    .with_issue(issue("a", Severity::High))
                    .with_suggestion(issue("s", Severity::Info)),
            ),
        );
        results.insert(
            "security_security_scanner",
            AgentOutcome::Failure(AgentFailure::new(
                FailureKind::Timeout,
                "Agent security_scanner timed out after 1s",
            )),
        );
        results.insert(
            "testing_python_test",
            AgentOutcome::Success(
                RawAgentResult::new("python_test")
                    .with_issue(issue("a", Severity::High))
                    .with_issue(issue("b", Severity::Low)),
            ),
        );
        results
    }

    #[test]
    fn test_concatenates_in_slot_order_without_dedup() {
        let report = ResultAggregator::new().combine(&results());
        let titles: Vec<&str> = report.issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "a", "b"]);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.agent_results.len(), 3);
    }

    #[test]
    fn test_failures_go_to_metadata() {
        let report = ResultAggregator::new().combine(&results());
        assert_eq!(
            report.agent_error("security_security_scanner"),
            Some("Agent security_scanner timed out after 1s")
        );
        assert!(report.security_findings.is_empty());
        assert_eq!(report.metadata["total_agents"], 3);
        assert_eq!(report.metadata["successful_agents"], 2);
        assert_eq!(report.metadata["failed_agents"], 1);
        assert_eq!(report.metadata["total_issues"], 3);
        assert_eq!(report.metadata["severity_counts"]["high"], 2);
        assert_eq!(report.metadata["severity_counts"]["critical"], 0);
    }

    #[test]
    fn test_bucketing_by_key() {
        let report = ResultAggregator::new().combine(&results());
        assert_eq!(report.code_analysis.keys().collect::<Vec<_>>(), vec!["code_python_code"]);
        assert_eq!(report.test_results.keys().collect::<Vec<_>>(), vec!["testing_python_test"]);
    }

    #[test]
    fn test_key_may_land_in_several_buckets() {
        let mut results = AgentResults::new();
        results.insert(
            "testing_security_test_code",
            AgentOutcome::Success(RawAgentResult::new("security_test_code")),
        );
        let report = ResultAggregator::new().combine(&results);
        assert_eq!(report.code_analysis.len(), 1);
        assert_eq!(report.test_results.len(), 1);
        assert_eq!(report.security_findings.len(), 1);
    }

    #[test]
    fn test_empty_results() {
        let report = ResultAggregator::new().combine(&AgentResults::new());
        assert!(report.issues.is_empty());
        assert_eq!(report.metadata["total_agents"], 0);
    }
}
