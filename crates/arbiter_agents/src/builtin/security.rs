//! Security scanner: injection, secrets and dependency hygiene.
//!
//! Findings use two types. `vulnerability` marks exploitable code patterns
//! (CWE referenced in the description); `security` marks leaked secrets.
//! Both block the `security_compliance` gate regardless of severity.

use std::sync::Arc;

use async_trait::async_trait;

use super::rules::{self, LineRule, RuleSpec, RuleTarget};
use super::AgentBase;
use crate::capability::{Capability, CapabilitySet};
use crate::error::AgentResult;
use crate::llm::LlmClient;
use crate::stats::AgentStatsSnapshot;
use crate::traits::{Agent, AgentContext, Finding, RawAgentResult, Severity};

static RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "eval",
        pattern: r"\beval\(",
        finding_type: "vulnerability",
        severity: Severity::High,
        title: "Use of eval()",
        description: "CWE-94: evaluating strings can lead to code injection",
        suggestion: Some("Parse data with JSON.parse or ast.literal_eval instead"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "inner-html-template",
        pattern: r"\.innerHTML\s*=.*(\$\{|\+)",
        finding_type: "vulnerability",
        severity: Severity::High,
        title: "Dynamic innerHTML",
        description: "CWE-79: interpolated HTML may allow XSS",
        suggestion: Some("Use textContent or sanitize before insertion"),
        target: RuleTarget::Issue,
        confidence: 0.85,
    },
    RuleSpec {
        id: "dangerous-html",
        pattern: r"dangerouslySetInnerHTML",
        finding_type: "vulnerability",
        severity: Severity::Medium,
        title: "dangerouslySetInnerHTML",
        description: "CWE-79: unsanitized HTML can lead to XSS",
        suggestion: Some("Sanitize with DOMPurify or similar"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
    RuleSpec {
        id: "sql-format",
        pattern: r#"(?i)(execute|query)\(\s*(f["']|["'].*["']\s*(%|\+|\.format\()|`.*\$\{).*\b(select|insert|update|delete)\b"#,
        finding_type: "vulnerability",
        severity: Severity::Critical,
        title: "SQL built from strings",
        description: "CWE-89: formatted SQL is open to injection",
        suggestion: Some("Use parameterized queries"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
    RuleSpec {
        id: "shell-command",
        pattern: r"os\.system\(|shell\s*=\s*True|child_process\.exec\(",
        finding_type: "vulnerability",
        severity: Severity::High,
        title: "Shell command execution",
        description: "CWE-78: shell interpolation enables command injection",
        suggestion: Some("Pass arguments as a list without a shell"),
        target: RuleTarget::Issue,
        confidence: 0.85,
    },
    RuleSpec {
        id: "pickle",
        pattern: r"pickle\.loads?\(",
        finding_type: "vulnerability",
        severity: Severity::High,
        title: "Pickle deserialization",
        description: "CWE-502: unpickling untrusted data executes code",
        suggestion: Some("Use JSON or another data-only format"),
        target: RuleTarget::Issue,
        confidence: 0.9,
    },
    RuleSpec {
        id: "hardcoded-password",
        pattern: r#"(?i)\b(password|passwd|pwd)\s*[=:]\s*["'][^"'$]{4,}["']"#,
        finding_type: "security",
        severity: Severity::Critical,
        title: "Hardcoded password",
        description: "CWE-798: credentials committed to source",
        suggestion: Some("Load secrets from the environment or a vault"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
    RuleSpec {
        id: "api-key",
        pattern: r#"(?i)\b(api[_-]?key|secret[_-]?key|access[_-]?token)\s*[=:]\s*["'][A-Za-z0-9_\-]{20,}["']"#,
        finding_type: "security",
        severity: Severity::High,
        title: "Hardcoded API key",
        description: "CWE-798: API key committed to source",
        suggestion: Some("Load secrets from the environment or a vault"),
        target: RuleTarget::Issue,
        confidence: 0.8,
    },
    RuleSpec {
        id: "aws-access-key",
        pattern: r"AKIA[A-Z0-9]{16}",
        finding_type: "security",
        severity: Severity::Critical,
        title: "AWS access key ID",
        description: "CWE-798: AWS credentials committed to source",
        suggestion: Some("Revoke the key and use IAM roles or the credential chain"),
        target: RuleTarget::Issue,
        confidence: 0.95,
    },
    RuleSpec {
        id: "private-key",
        pattern: r"-----BEGIN (RSA |EC |OPENSSH |DSA )?PRIVATE KEY-----",
        finding_type: "security",
        severity: Severity::Critical,
        title: "Private key in source",
        description: "CWE-321: private key material committed to source",
        suggestion: Some("Remove the key from history and rotate it"),
        target: RuleTarget::Issue,
        confidence: 1.0,
    },
];

/// Multi-language security scanner. Accepts any file type.
pub struct SecurityScannerAgent {
    base: AgentBase,
    rules: Vec<LineRule>,
}

impl SecurityScannerAgent {
    pub const NAME: &'static str = "security_scanner";

    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            base: AgentBase::new(
                Self::NAME,
                "You are an application security engineer. Reference CWE ids where relevant.",
                llm,
            ),
            rules: rules::compile(RULES),
        }
    }

    fn file_name(path: &str) -> &str {
        std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
    }

    /// Unpinned entries in a pip requirements file.
    fn check_requirements(&self, content: &str, result: &mut RawAgentResult) {
        for (idx, line) in content.lines().enumerate() {
            let entry = line.split('#').next().unwrap_or("").trim();
            if entry.is_empty() || entry.starts_with('-') {
                continue;
            }
            if !entry.contains("==") {
                result.issues.push(
                    Finding::new(
                        "dependency",
                        Severity::Medium,
                        format!("Unpinned dependency: {}", entry),
                    )
                    .with_description("Unpinned versions can pull in vulnerable releases")
                    .from_agent(Self::NAME)
                    .at_line((idx + 1) as u32)
                    .with_suggestion("Pin an exact version with =="),
                );
            }
        }
    }

    /// Wildcard versions in package.json dependency tables.
    fn check_package_json(&self, content: &str, result: &mut RawAgentResult) {
        let Ok(manifest) = serde_json::from_str::<serde_json::Value>(content) else {
            result.suggestions.push(
                Finding::new("dependency", Severity::Info, "package.json could not be parsed")
                    .from_agent(Self::NAME),
            );
            return;
        };
        for table in ["dependencies", "devDependencies"] {
            let Some(deps) = manifest.get(table).and_then(|d| d.as_object()) else {
                continue;
            };
            for (name, version) in deps {
                let version = version.as_str().unwrap_or("");
                if version == "*" || version == "latest" || version.is_empty() {
                    result.issues.push(
                        Finding::new(
                            "dependency",
                            Severity::Medium,
                            format!("Unpinned dependency: {}", name),
                        )
                        .with_description(format!("{} accepts any version", table))
                        .from_agent(Self::NAME)
                        .with_suggestion("Pin a version range and commit the lockfile"),
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Agent for SecurityScannerAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from([
            Capability::SecurityAnalysis,
            Capability::DependencyAnalysis,
            Capability::ChatSupport,
        ])
    }

    async fn analyze(
        &self,
        path: &str,
        content: &str,
        _context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        self.base.check_input(self.validate(path, content), path)?;

        let mut result = RawAgentResult::new(Self::NAME);
        let hits = match Self::file_name(path) {
            "requirements.txt" => {
                self.check_requirements(content, &mut result);
                0
            }
            "package.json" => {
                self.check_package_json(content, &mut result);
                0
            }
            _ => rules::scan(&self.rules, Self::NAME, content, &mut result),
        };

        let critical = result
            .issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .count();
        let summary = format!(
            "{} security findings ({} critical) in {}",
            result.issues.len(),
            critical,
            path
        );
        let result = result
            .with_summary(summary)
            .with_metric("rule_hits", &hits)
            .with_metric("critical", &critical);
        Ok(self.base.finish(result))
    }

    async fn chat(&self, context: &AgentContext) -> AgentResult<String> {
        self.base
            .chat(
                context,
                "Validate input at the boundary, parameterize queries, and keep secrets out of source control.",
            )
            .await
    }

    fn stats(&self) -> AgentStatsSnapshot {
        self.base.stats().snapshot()
    }
}
