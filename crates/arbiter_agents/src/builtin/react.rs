//! React / JavaScript agents.

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

const EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];
const FRAMEWORKS: &[&str] = &["react", "next"];

/// Components longer than this get a split suggestion.
const LARGE_COMPONENT_LINES: usize = 300;

static CODE_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "no-var",
        pattern: r"^\s*var\s+\w+",
        finding_type: "style",
        severity: Severity::Low,
        title: "Use of var",
        description: "var is function scoped and hoisted",
        suggestion: Some("Declare with const, or let when reassigned"),
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
    RuleSpec {
        id: "no-console",
        pattern: r"console\.(log|debug)\(",
        finding_type: "style",
        severity: Severity::Low,
        title: "Console statement left in code",
        description: "Debug output ships to the browser console",
        suggestion: Some("Remove it or route it through a logger"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "dangerous-html",
        pattern: r"dangerouslySetInnerHTML",
        finding_type: "best_practice",
        severity: Severity::High,
        title: "dangerouslySetInnerHTML used",
        description: "Raw HTML bypasses React's escaping",
        suggestion: Some("Render structured content, or sanitize with DOMPurify first"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "inline-handler",
        pattern: r"\bon[A-Z]\w*=\{\s*\([^)]*\)\s*=>",
        finding_type: "performance",
        severity: Severity::Info,
        title: "Inline event handler",
        description: "A new function is created on every render",
        suggestion: Some("Hoist the handler or wrap it in useCallback"),
        target: RuleTarget::Suggestion,
        confidence: 0.6,
    },
    RuleSpec {
        id: "index-key",
        pattern: r"key=\{\s*(index|idx|i)\s*\}",
        finding_type: "best_practice",
        severity: Severity::Medium,
        title: "Array index used as key",
        description: "Index keys break reconciliation when the list reorders",
        suggestion: Some("Use a stable id from the item"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
];

static TEST_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "focused-test",
        pattern: r"\b(it|test|describe)\.only\(",
        finding_type: "test_quality",
        severity: Severity::High,
        title: "Focused test",
        description: ".only silently skips the rest of the suite",
        suggestion: Some("Remove .only before committing"),
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
    RuleSpec {
        id: "skipped-test",
        pattern: r"\b(it|test|describe)\.skip\(|\bx(it|describe)\(",
        finding_type: "test_quality",
        severity: Severity::Low,
        title: "Skipped test",
        description: "Skipped tests hide regressions",
        suggestion: None,
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "real-timer",
        pattern: r"setTimeout\(",
        finding_type: "test_quality",
        severity: Severity::Medium,
        title: "Real timer in test",
        description: "Waiting on wall-clock time makes tests slow and flaky",
        suggestion: Some("Use jest.useFakeTimers() or waitFor"),
        target: RuleTarget::Issue,
        confidence: 0.7,
    },
];

fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.contains(".test.") || lower.contains(".spec.") || lower.contains("__tests__")
}

/// React code agent: hooks, rendering and style checks.
pub struct ReactCodeAgent {
    base: AgentBase,
    rules: Vec<LineRule>,
    map_call: Option<Regex>,
}

impl ReactCodeAgent {
    pub const NAME: &'static str = "javascript_react_code";

    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            base: AgentBase::new(
                Self::NAME,
                "You are a senior React engineer. Answer concisely with code where useful.",
                llm,
            ),
            rules: rules::compile(CODE_RULES),
            map_call: Regex::new(r"\.map\(\s*\(?[\w\s,]*\)?\s*=>\s*\(?\s*<\w+").ok(),
        }
    }

    /// `useEffect` calls whose closing line has no dependency array.
    fn effects_without_deps(&self, content: &str, result: &mut RawAgentResult) {
        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if !line.contains("useEffect(") {
                continue;
            }
            let closing = lines[idx..]
                .iter()
                .take(40)
                .find(|l| l.trim_start().starts_with("})") || l.trim_start().starts_with("}, ["));
            let has_deps = closing.map(|l| l.contains('[')).unwrap_or(true);
            if !has_deps {
                result.issues.push(
                    Finding::new(
                        "performance",
                        Severity::Medium,
                        "useEffect without dependency array",
                    )
                    .with_description("The effect runs after every render")
                    .from_agent(Self::NAME)
                    .with_confidence(0.75)
                    .at_line((idx + 1) as u32)
                    .with_suggestion("Pass the values the effect reads as dependencies"),
                );
            }
        }
    }

    /// `.map()` rendering JSX with no `key` prop on the same line.
    fn lists_without_key(&self, content: &str, result: &mut RawAgentResult) {
        let Some(map_call) = &self.map_call else {
            return;
        };
        for (idx, line) in content.lines().enumerate() {
            if map_call.is_match(line) && !line.contains("key=") {
                result.issues.push(
                    Finding::new("best_practice", Severity::Medium, "List item without key")
                        .with_description("React needs a key to track list items")
                        .from_agent(Self::NAME)
                        .with_confidence(0.7)
                        .at_line((idx + 1) as u32)
                        .with_suggestion("Add a stable key prop to the mapped element"),
                );
            }
        }
    }

    fn size_suggestion(&self, content: &str) -> Option<Finding> {
        let lines = content.lines().count();
        (lines > LARGE_COMPONENT_LINES).then(|| {
            Finding::new("maintainability", Severity::Info, "Large component file")
                .with_description(format!("{} lines in one file", lines))
                .from_agent(Self::NAME)
                .with_confidence(0.5)
                .with_suggestion("Split into smaller components or custom hooks")
        })
    }
}

#[async_trait]
impl Agent for ReactCodeAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from([
            Capability::CodeAnalysis,
            Capability::StyleCheck,
            Capability::PerformanceAnalysis,
            Capability::CodeOptimization,
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
        self.effects_without_deps(content, &mut result);
        self.lists_without_key(content, &mut result);
        if let Some(suggestion) = self.size_suggestion(content) {
            result.suggestions.push(suggestion);
        }

        let summary = format!(
            "{} issues, {} suggestions in {}",
            result.issues.len(),
            result.suggestions.len(),
            path
        );
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
                "Keep components small, give list items stable keys, and list every value an effect reads in its dependency array.",
            )
            .await
    }

    async fn optimize(
        &self,
        path: &str,
        content: &str,
        context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        let analysis = self.analyze(path, content, context).await?;
        let mut result = RawAgentResult::new(Self::NAME);
        for issue in analysis
            .issues
            .into_iter()
            .chain(analysis.suggestions)
            .filter(|f| f.finding_type == "performance")
        {
            result.suggestions.push(issue);
        }
        if content.contains("export default function")
            && !content.contains("React.memo")
            && !content.contains("memo(")
        {
            result.suggestions.push(
                Finding::new("performance", Severity::Info, "Consider React.memo")
                    .from_agent(Self::NAME)
                    .with_confidence(0.4)
                    .with_suggestion("Wrap pure components in React.memo to skip re-renders"),
            );
        }
        let count = result.suggestions.len();
        Ok(result.with_summary(format!("{} optimization opportunities", count)))
    }

    fn stats(&self) -> AgentStatsSnapshot {
        self.base.stats().snapshot()
    }
}

/// Jest / React Testing Library agent.
pub struct ReactTestAgent {
    base: AgentBase,
    rules: Vec<LineRule>,
    exports: Option<Regex>,
}

impl ReactTestAgent {
    pub const NAME: &'static str = "javascript_react_test";

    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            base: AgentBase::new(
                Self::NAME,
                "You write Jest and React Testing Library tests. Prefer user-facing queries.",
                llm,
            ),
            rules: rules::compile(TEST_RULES),
            exports: Regex::new(
                r"export\s+(?:default\s+)?(?:function|const|class)\s+([A-Z]\w*)",
            )
            .ok(),
        }
    }

    fn components(&self, content: &str) -> Vec<String> {
        self.exports
            .as_ref()
            .map(|re| captured_names(re, content))
            .unwrap_or_default()
    }

    fn review_test_file(&self, content: &str, result: &mut RawAgentResult) -> usize {
        let hits = rules::scan(&self.rules, Self::NAME, content, result);
        let has_tests = ["it(", "test(", "it.only(", "test.only("]
            .iter()
            .any(|marker| content.contains(marker));
        if has_tests && !content.contains("expect(") {
            result.issues.push(
                Finding::new("test_quality", Severity::High, "Tests without assertions")
                    .with_description("Test cases never call expect()")
                    .from_agent(Self::NAME)
                    .with_confidence(0.85),
            );
        }
        hits
    }

    fn suggest_tests(&self, content: &str, result: &mut RawAgentResult) {
        for component in self.components(content) {
            result.suggestions.push(
                Finding::new(
                    "test_coverage",
                    Severity::Info,
                    format!("Add tests for {}", component),
                )
                .from_agent(Self::NAME)
                .with_confidence(0.6)
                .with_suggestion(format!(
                    "render(<{} />) and assert on what the user sees",
                    component
                )),
            );
        }
    }
}

#[async_trait]
impl Agent for ReactTestAgent {
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
        let hits = if test_file {
            self.review_test_file(content, &mut result)
        } else {
            self.suggest_tests(content, &mut result);
            0
        };

        for (key, count) in upstream_high_findings(context) {
            result.suggestions.push(
                Finding::new("test_coverage", Severity::Info, "Add regression tests")
                    .with_description(format!("{} reported {} high severity issues", key, count))
                    .from_agent(Self::NAME)
                    .with_confidence(0.7)
                    .with_suggestion(
                        "Cover each reported issue with a failing test before fixing it",
                    ),
            );
        }

        let summary = if test_file {
            format!("Reviewed test file {}", path)
        } else {
            format!("{} test suggestions for {}", result.suggestions.len(), path)
        };
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
                "Test behaviour, not implementation: render the component, query by role or label, and assert on visible output.",
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
            .unwrap_or("component");
        let mut out = String::from("import { render, screen } from '@testing-library/react';\n");
        let components = self.components(content);
        if !components.is_empty() {
            out.push_str(&format!(
                "import {{ {} }} from './{}';\n",
                components.join(", "),
                module
            ));
        }
        for component in &components {
            out.push_str(&format!(
                "\ndescribe('{c}', () => {{\n  it('renders', () => {{\n    render(<{c} />);\n    expect(screen.getByRole('main')).toBeInTheDocument();\n  }});\n}});\n",
                c = component
            ));
        }
        self.base.stats().record_test_generation();
        Ok(out)
    }

    fn stats(&self) -> AgentStatsSnapshot {
        self.base.stats().snapshot()
    }
}
