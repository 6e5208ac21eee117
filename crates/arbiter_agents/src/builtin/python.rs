//! Python agents.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use super::rules::{self, LineRule, RuleSpec, RuleTarget};
use super::{captured_names, upstream_high_findings, AgentBase};
use crate::capability::{Capability, CapabilitySet};
use crate::error::AgentResult;
use crate::llm::LlmClient;
use crate::stats::AgentStatsSnapshot;
use crate::traits::{Agent, AgentContext, Finding, RawAgentResult, Severity};

const EXTENSIONS: &[&str] = &["py", "pyi"];
const FRAMEWORKS: &[&str] = &["django", "flask", "fastapi"];

const MAX_LINE_LENGTH: usize = 120;

static CODE_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "bare-except",
        pattern: r"^\s*except\s*:",
        finding_type: "error_handling",
        severity: Severity::High,
        title: "Bare except",
        description: "Catches SystemExit and KeyboardInterrupt too",
        suggestion: Some("Catch a specific exception, or at least Exception"),
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
    RuleSpec {
        id: "mutable-default",
        pattern: r"def\s+\w+\(.*=\s*(\[\]|\{\}|set\(\))",
        finding_type: "bug_risk",
        severity: Severity::High,
        title: "Mutable default argument",
        description: "The default is shared between calls",
        suggestion: Some("Default to None and create the value inside the function"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "wildcard-import",
        pattern: r"^\s*from\s+\S+\s+import\s+\*",
        finding_type: "style",
        severity: Severity::Medium,
        title: "Wildcard import",
        description: "Pollutes the namespace and hides where names come from",
        suggestion: Some("Import the names you use explicitly"),
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
    RuleSpec {
        id: "none-comparison",
        pattern: r"[=!]=\s*None\b",
        finding_type: "style",
        severity: Severity::Low,
        title: "Comparison to None with ==",
        description: "Equality can be overridden; identity cannot",
        suggestion: Some("Use `is None` / `is not None`"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "print-call",
        pattern: r"^\s*print\(",
        finding_type: "style",
        severity: Severity::Info,
        title: "print() call",
        description: "Output bypasses the logging configuration",
        suggestion: Some("Use the logging module"),
        target: RuleTarget::Suggestion,
        confidence: 0.6,
    },
];

static TEST_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "skip-marker",
        pattern: r"@pytest\.mark\.skip\b",
        finding_type: "test_quality",
        severity: Severity::Low,
        title: "Skipped test",
        description: "Unconditional skips hide regressions",
        suggestion: Some("Use skipif with a reason, or delete the test"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "sleep",
        pattern: r"time\.sleep\(",
        finding_type: "test_quality",
        severity: Severity::Medium,
        title: "Sleep in test",
        description: "Wall-clock waits make tests slow and flaky",
        suggestion: Some("Mock the clock or poll for the condition"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
    RuleSpec {
        id: "assert-true-literal",
        pattern: r"^\s*assert\s+True\b",
        finding_type: "test_quality",
        severity: Severity::Medium,
        title: "Assertion that always passes",
        description: "assert True checks nothing",
        suggestion: None,
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
];

fn is_test_path(path: &str) -> bool {
    let file = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    file.starts_with("test_") || file.ends_with("_test.py") || file == "conftest.py"
}

/// Python code agent: style and common bug patterns.
pub struct PythonCodeAgent {
    base: AgentBase,
    rules: Vec<LineRule>,
    public_defs: Option<Regex>,
}

impl PythonCodeAgent {
    pub const NAME: &'static str = "python_code";

    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            base: AgentBase::new(
                Self::NAME,
                "You are an experienced Python reviewer. Prefer idiomatic, typed Python 3.",
                llm,
            ),
            rules: rules::compile(CODE_RULES),
            public_defs: Regex::new(r"(?m)^(?:def|class)\s+([A-Za-z_]\w*)").ok(),
        }
    }

    fn long_lines(&self, content: &str, result: &mut RawAgentResult) {
        for (idx, line) in content.lines().enumerate() {
            if line.chars().count() > MAX_LINE_LENGTH {
                result.issues.push(
                    Finding::new("style", Severity::Low, "Line too long")
                        .with_description(format!(
                            "{} characters (limit {})",
                            line.chars().count(),
                            MAX_LINE_LENGTH
                        ))
                        .from_agent(Self::NAME)
                        .at_line((idx + 1) as u32),
                );
            }
        }
    }

    /// Top-level public definitions whose next line is not a docstring.
    fn missing_docstrings(&self, content: &str, result: &mut RawAgentResult) {
        let Some(defs) = &self.public_defs else {
            return;
        };
        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            let Some(name) = defs.captures(line).and_then(|c| c.get(1)) else {
                continue;
            };
            if name.as_str().starts_with('_') {
                continue;
            }
            let documented = lines
                .get(idx + 1)
                .map(|next| {
                    let next = next.trim_start();
                    next.starts_with("\"\"\"") || next.starts_with("'''")
                })
                .unwrap_or(false);
            if !documented {
                result.suggestions.push(
                    Finding::new(
                        "documentation",
                        Severity::Info,
                        format!("Document {}", name.as_str()),
                    )
                    .from_agent(Self::NAME)
                    .with_confidence(0.5)
                    .at_line((idx + 1) as u32)
                    .with_suggestion("Add a docstring describing arguments and return value"),
                );
            }
        }
    }
}

#[async_trait]
impl Agent for PythonCodeAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from([
            Capability::CodeAnalysis,
            Capability::StyleCheck,
            Capability::DocGeneration,
            Capability::ChatSupport,
        ])
    }

    fn supported_extensions(&self) -> &[&'static str] {
        EXTENSIONS
    }

    fn supported_frameworks(&self) -> &[&'static str] {
        FRAMEWORKS
    }

    async fn analyze(
        &self,
        path: &str,
        content: &str,
        _context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        self.base.check_input(self.validate(path, content), path)?;

        let mut result = RawAgentResult::new(Self::NAME);
        let hits = rules::scan(&self.rules, Self::NAME, content, &mut result);
        self.long_lines(content, &mut result);
        self.missing_docstrings(content, &mut result);

        let summary = format!("{} issues in {}", result.issues.len(), path);
        let result = result
            .with_summary(summary)
            .with_metric("lines", &content.lines().count())
            .with_metric("rule_hits", &hits);
        Ok(self.base.finish(result))
    }

    async fn chat(&self, context: &AgentContext) -> AgentResult<String> {
        self.base
            .chat(
                context,
                "Catch specific exceptions, avoid mutable defaults, and log instead of printing.",
            )
            .await
    }

    fn stats(&self) -> AgentStatsSnapshot {
        self.base.stats().snapshot()
    }
}

/// pytest agent.
pub struct PythonTestAgent {
    base: AgentBase,
    rules: Vec<LineRule>,
    functions: Option<Regex>,
}

impl PythonTestAgent {
    pub const NAME: &'static str = "python_test";

    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            base: AgentBase::new(
                Self::NAME,
                "You write focused pytest tests with fixtures and parametrize.",
                llm,
            ),
            rules: rules::compile(TEST_RULES),
            functions: Regex::new(r"(?m)^def\s+([A-Za-z_]\w*)\s*\(").ok(),
        }
    }

    fn functions(&self, content: &str) -> Vec<String> {
        self.functions
            .as_ref()
            .map(|re| captured_names(re, content))
            .unwrap_or_default()
    }
}

#[async_trait]
impl Agent for PythonTestAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from([
            Capability::CodeAnalysis,
            Capability::TestGeneration,
            Capability::ChatSupport,
        ])
    }

    fn supported_extensions(&self) -> &[&'static str] {
        EXTENSIONS
    }

    fn supported_frameworks(&self) -> &[&'static str] {
        FRAMEWORKS
    }

    async fn analyze(
        &self,
        path: &str,
        content: &str,
        context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        self.base.check_input(self.validate(path, content), path)?;

        let mut result = RawAgentResult::new(Self::NAME);
        let test_file = is_test_path(path);
        let mut hits = 0;

        if test_file {
            hits = rules::scan(&self.rules, Self::NAME, content, &mut result);
            let tests = self
                .functions(content)
                .into_iter()
                .filter(|f| f.starts_with("test_"))
                .count();
            if tests > 0 && !content.contains("assert") && !content.contains("pytest.raises") {
                result.issues.push(
                    Finding::new("test_quality", Severity::High, "Tests without assertions")
                        .with_description(format!("{} test functions assert nothing", tests))
                        .from_agent(Self::NAME)
                        .with_confidence(0.85),
                );
            }
        } else {
            for function in self.functions(content) {
                result.suggestions.push(
                    Finding::new(
                        "test_coverage",
                        Severity::Info,
                        format!("Add tests for {}", function),
                    )
                    .from_agent(Self::NAME)
                    .with_confidence(0.6)
                    .with_suggestion(format!(
                        "Write test_{} covering normal and edge inputs",
                        function
                    )),
                );
            }
        }

        for (key, count) in upstream_high_findings(context) {
            result.suggestions.push(
                Finding::new("test_coverage", Severity::Info, "Add regression tests")
                    .with_description(format!("{} reported {} high severity issues", key, count))
                    .from_agent(Self::NAME)
                    .with_confidence(0.7),
            );
        }

        let summary = format!("{} suggestions for {}", result.suggestions.len(), path);
        let result = result
            .with_summary(summary)
            .with_metric("test_file", &test_file)
            .with_metric("rule_hits", &hits);
        Ok(self.base.finish(result))
    }

    async fn chat(&self, context: &AgentContext) -> AgentResult<String> {
        self.base
            .chat(
                context,
                "Keep each test to one behaviour, use fixtures for setup, and parametrize edge cases.",
            )
            .await
    }

    async fn generate_tests(
        &self,
        path: &str,
        content: &str,
        _context: &AgentContext,
    ) -> AgentResult<String> {
        self.base.check_input(self.validate(path, content), path)?;

        let module = std::path::Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module");
        let functions = self.functions(content);

        let mut out = String::from("import pytest\n\n");
        if !functions.is_empty() {
            out.push_str(&format!("from {} import {}\n", module, functions.join(", ")));
        }
        for function in &functions {
            out.push_str(&format!(
                "\n\ndef test_{f}():\n    result = {f}()\n    assert result is not None\n",
                f = function
            ));
        }
        self.base.stats().record_test_generation();
        Ok(out)
    }

    fn stats(&self) -> AgentStatsSnapshot {
        self.base.stats().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODULE: &str = r#"from os.path import *

def load(path, cache={}):
    try:
        return open(path).read()
    except:
        print("failed")
        if cache == None:
            return ""

def _helper():
    """Private."""
    pass
"#;

    #[tokio::test]
    async fn test_code_agent_flags_python_smells() {
        let agent = PythonCodeAgent::new(None);
        let result = agent
            .analyze("app/io.py", MODULE, &AgentContext::new())
            .await
            .unwrap();

        let titles: Vec<&str> = result.issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Wildcard import",
                "Mutable default argument",
                "Bare except",
                "Comparison to None with ==",
            ]
        );
        assert_eq!(result.issues[2].line_number, Some(6));

        let suggestions: Vec<&str> = result.suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(suggestions, vec!["print() call", "Document load"]);
    }

    #[tokio::test]
    async fn test_long_lines() {
        let agent = PythonCodeAgent::new(None);
        let content = format!("x = '{}'\n", "a".repeat(130));
        let result = agent
            .analyze("a.py", &content, &AgentContext::new())
            .await
            .unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].title, "Line too long");
    }

    #[tokio::test]
    async fn test_test_agent_on_test_file() {
        let agent = PythonTestAgent::new(None);
        let content = "import time\n\ndef test_load():\n    time.sleep(1)\n    load('x')\n";
        let result = agent
            .analyze("tests/test_io.py", content, &AgentContext::new())
            .await
            .unwrap();

        let titles: Vec<&str> = result.issues.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Sleep in test", "Tests without assertions"]);
    }

    #[tokio::test]
    async fn test_test_agent_suggests_tests_for_source() {
        let agent = PythonTestAgent::new(None);
        let result = agent
            .analyze("app/io.py", MODULE, &AgentContext::new())
            .await
            .unwrap();
        let titles: Vec<&str> = result.suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Add tests for load"]);
        assert_eq!(result.summary.as_deref(), Some("1 suggestions for app/io.py"));
    }

    #[tokio::test]
    async fn test_generate_pytest_skeleton() {
        let agent = PythonTestAgent::new(None);
        let out = agent
            .generate_tests("app/io.py", MODULE, &AgentContext::new())
            .await
            .unwrap();
        assert!(out.starts_with("import pytest"));
        assert!(out.contains("from io import load\n"));
        assert!(out.contains("def test_load():"));
        assert!(!out.contains("_helper"));
    }
}
