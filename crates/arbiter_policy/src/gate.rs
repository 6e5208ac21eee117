//! Quality gate trait and the built-in gates.

use arbiter_agents::Severity;
use arbiter_core::AggregatedReport;
use serde::{Deserialize, Serialize};

use crate::config::{CodeQualityConfig, SecurityComplianceConfig};

/// Result of one gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateResult {
    pub gate: String,
    pub passed: bool,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<String>,
}

impl GateResult {
    pub fn pass(gate: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            passed: true,
            detail: detail.into(),
            recommendations: Vec::new(),
        }
    }

    pub fn fail(gate: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            passed: false,
            detail: detail.into(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_recommendation(mut self, rec: impl Into<String>) -> Self {
        self.recommendations.push(rec.into());
        self
    }
}

/// A named pass/fail predicate over a report.
///
/// Implementations must be pure: the same report always gives the same result.
pub trait QualityGate: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, report: &AggregatedReport) -> GateResult;
}

/// Fails when too many `high` severity issues are reported.
///
/// Only `high` counts; `critical` issues are left to other gates.
#[derive(Debug, Clone)]
pub struct CodeQualityGate {
    config: CodeQualityConfig,
}

impl CodeQualityGate {
    pub const NAME: &'static str = "code_quality";

    pub fn new(config: CodeQualityConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for CodeQualityGate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, report: &AggregatedReport) -> GateResult {
        let high = report.count_severity(Severity::High);
        let limit = self.config.max_high_severity;
        if high > limit {
            GateResult::fail(
                Self::NAME,
                format!("{} high severity issues exceed the limit of {}", high, limit),
            )
            .with_recommendation("Resolve high severity issues before merging")
        } else {
            GateResult::pass(
                Self::NAME,
                format!("{} high severity issues (limit {})", high, limit),
            )
        }
    }
}

/// Zero tolerance for issues of a blocked type, whatever their severity.
#[derive(Debug, Clone)]
pub struct SecurityComplianceGate {
    config: SecurityComplianceConfig,
}

impl SecurityComplianceGate {
    pub const NAME: &'static str = "security_compliance";

    pub fn new(config: SecurityComplianceConfig) -> Self {
        Self { config }
    }
}

impl QualityGate for SecurityComplianceGate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, report: &AggregatedReport) -> GateResult {
        let blocked: Vec<_> = report.issues_of_type(&self.config.blocked_types).collect();
        if blocked.is_empty() {
            return GateResult::pass(Self::NAME, "No security issues found");
        }

        let mut result = GateResult::fail(
            Self::NAME,
            format!("{} security issues found", blocked.len()),
        );
        for issue in blocked {
            let location = issue
                .line_number
                .map(|l| format!(" (line {})", l))
                .unwrap_or_default();
            result = result.with_recommendation(format!("Fix: {}{}", issue.title, location));
        }
        result
    }
}

/// Coverage is not measured yet; this gate always passes and says so.
#[derive(Debug, Clone, Default)]
pub struct TestCoverageGate;

impl TestCoverageGate {
    pub const NAME: &'static str = "test_coverage";
}

impl QualityGate for TestCoverageGate {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(&self, _report: &AggregatedReport) -> GateResult {
        GateResult::pass(
            Self::NAME,
            "Coverage measurement is not implemented; gate always passes",
        )
    }
}
