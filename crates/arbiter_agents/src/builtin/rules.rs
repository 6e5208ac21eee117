//! Line-oriented regex rules shared by the built-in agents.

use regex::Regex;
use tracing::warn;

use crate::traits::{Finding, RawAgentResult, Severity};

/// Where a rule hit lands in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleTarget {
    Issue,
    Suggestion,
}

/// Static description of a rule.
#[derive(Debug)]
pub(crate) struct RuleSpec {
    pub id: &'static str,
    pub pattern: &'static str,
    pub finding_type: &'static str,
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub suggestion: Option<&'static str>,
    pub target: RuleTarget,
    pub confidence: f32,
}

/// A compiled rule.
pub(crate) struct LineRule {
    spec: &'static RuleSpec,
    regex: Regex,
}

impl LineRule {
    pub fn id(&self) -> &'static str {
        self.spec.id
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    fn finding(&self, agent: &str, line: u32) -> Finding {
        let spec = self.spec;
        let mut finding = Finding::new(spec.finding_type, spec.severity, spec.title)
            .with_description(spec.description)
            .from_agent(agent)
            .with_confidence(spec.confidence)
            .at_line(line);
        if let Some(text) = spec.suggestion {
            finding = finding.with_suggestion(text);
        }
        finding
    }
}

/// Compile rule specs, skipping (and logging) any invalid pattern.
pub(crate) fn compile(specs: &'static [RuleSpec]) -> Vec<LineRule> {
    specs
        .iter()
        .filter_map(|spec| match Regex::new(spec.pattern) {
            Ok(regex) => Some(LineRule { spec, regex }),
            Err(e) => {
                warn!("Skipping rule {}: invalid pattern: {}", spec.id, e);
                None
            }
        })
        .collect()
}

/// Run every rule over every line, appending hits to `result`.
///
/// Returns the number of hits.
pub(crate) fn scan(
    rules: &[LineRule],
    agent: &str,
    content: &str,
    result: &mut RawAgentResult,
) -> usize {
    let mut hits = 0;
    for (idx, line) in content.lines().enumerate() {
        for rule in rules {
            if !rule.is_match(line) {
                continue;
            }
            hits += 1;
            let finding = rule.finding(agent, (idx + 1) as u32);
            match rule.spec.target {
                RuleTarget::Issue => result.issues.push(finding),
                RuleTarget::Suggestion => result.suggestions.push(finding),
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    static SPECS: &[RuleSpec] = &[
        RuleSpec {
            id: "todo",
            pattern: r"TODO",
            finding_type: "style",
            severity: Severity::Low,
            title: "TODO left in code",
            description: "Unfinished work marker",
            suggestion: None,
            target: RuleTarget::Issue,
            confidence: 0.9,
        },
        RuleSpec {
            id: "broken",
            pattern: r"([",
            finding_type: "style",
            severity: Severity::Low,
            title: "never compiles",
            description: "",
            suggestion: None,
            target: RuleTarget::Issue,
            confidence: 1.0,
        },
        RuleSpec {
            id: "print",
            pattern: r"^\s*print\(",
            finding_type: "style",
            severity: Severity::Info,
            title: "print call",
            description: "",
            suggestion: Some("Use logging"),
            target: RuleTarget::Suggestion,
            confidence: 0.5,
        },
    ];

    #[test]
    fn test_invalid_patterns_are_skipped() {
        let rules = compile(SPECS);
        let ids: Vec<&str> = rules.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["todo", "print"]);
    }

    #[test]
    fn test_scan_reports_line_numbers() {
        let rules = compile(SPECS);
        let mut result = RawAgentResult::new("demo");
        let hits = scan(&rules, "demo", "x = 1\n# TODO fix\nprint(x)\n", &mut result);

        assert_eq!(hits, 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].line_number, Some(2));
        assert_eq!(result.issues[0].source_agent, "demo");
        assert_eq!(result.suggestions[0].suggestion_text.as_deref(), Some("Use logging"));
    }
}
