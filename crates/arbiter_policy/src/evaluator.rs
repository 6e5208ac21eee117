//! Runs named gates over a report.

use std::sync::Arc;

use arbiter_core::AggregatedReport;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GateConfig;
use crate::gate::{
    CodeQualityGate, GateResult, QualityGate, SecurityComplianceGate, TestCoverageGate,
};

/// Outcome of evaluating a list of gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    /// AND of every evaluated gate; `true` when none were evaluated
    pub passed: bool,
    /// One message per failed gate
    pub errors: Vec<String>,
    pub results: Vec<GateResult>,
}

impl Default for GateReport {
    fn default() -> Self {
        Self {
            passed: true,
            errors: Vec::new(),
            results: Vec::new(),
        }
    }
}

/// Registry of named gates.
#[derive(Clone)]
pub struct QualityGateEvaluator {
    gates: Vec<Arc<dyn QualityGate>>,
}

impl Default for QualityGateEvaluator {
    fn default() -> Self {
        Self::new(&GateConfig::default())
    }
}

impl QualityGateEvaluator {
    /// Evaluator with the built-in gates configured from `config`.
    pub fn new(config: &GateConfig) -> Self {
        Self::empty()
            .with(Arc::new(CodeQualityGate::new(config.code_quality.clone())))
            .with(Arc::new(SecurityComplianceGate::new(
                config.security_compliance.clone(),
            )))
            .with(Arc::new(TestCoverageGate))
    }

    /// Evaluator with no gates.
    pub fn empty() -> Self {
        Self { gates: Vec::new() }
    }

    /// Register a gate, replacing any gate with the same name.
    pub fn register(&mut self, gate: Arc<dyn QualityGate>) {
        match self.gates.iter_mut().find(|g| g.name() == gate.name()) {
            Some(existing) => *existing = gate,
            None => self.gates.push(gate),
        }
    }

    pub fn with(mut self, gate: Arc<dyn QualityGate>) -> Self {
        self.register(gate);
        self
    }

    pub fn gate_names(&self) -> Vec<&str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Evaluate the named gates in order.
    ///
    /// Unknown names are skipped. Every known gate runs, even after a failure.
    pub fn evaluate<S: AsRef<str>>(
        &self,
        report: &AggregatedReport,
        gate_names: &[S],
    ) -> GateReport {
        let mut gate_report = GateReport::default();

        for name in gate_names {
            let name = name.as_ref();
            let Some(gate) = self.gates.iter().find(|g| g.name() == name) else {
                debug!("Ignoring unknown quality gate: {}", name);
                continue;
            };

            let result = gate.evaluate(report);
            debug!("Gate {} passed={}: {}", name, result.passed, result.detail);
            if !result.passed {
                gate_report.passed = false;
                gate_report
                    .errors
                    .push(format!("Quality gate '{}' failed: {}", name, result.detail));
            }
            gate_report.results.push(result);
        }

        gate_report
    }
}

impl std::fmt::Debug for QualityGateEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityGateEvaluator")
            .field("gates", &self.gate_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbiter_agents::{Finding, Severity};

    struct AlwaysFails(&'static str);

    impl QualityGate for AlwaysFails {
        fn name(&self) -> &str {
            self.0
        }

        fn evaluate(&self, _report: &AggregatedReport) -> GateResult {
            GateResult::fail(self.0, "nope")
        }
    }

    fn report() -> AggregatedReport {
        AggregatedReport {
            issues: (0..7)
                .map(|i| Finding::new("vulnerability", Severity::High, format!("v{}", i)))
                .collect(),
            ..AggregatedReport::default()
        }
    }

    #[test]
    fn test_no_short_circuit() {
        let evaluator = QualityGateEvaluator::default();
        let gate_report = evaluator.evaluate(
            &report(),
            &["code_quality", "security_compliance", "test_coverage"],
        );

        assert!(!gate_report.passed);
        assert_eq!(gate_report.results.len(), 3);
        assert_eq!(gate_report.errors.len(), 2);
        assert!(gate_report.errors[0].starts_with("Quality gate 'code_quality' failed"));
        assert!(gate_report.errors[1].starts_with("Quality gate 'security_compliance' failed"));
    }

    #[test]
    fn test_unknown_gates_are_ignored() {
        let evaluator = QualityGateEvaluator::default();
        let gate_report = evaluator.evaluate(&report(), &["performance_budget", "test_coverage"]);
        assert!(gate_report.passed);
        assert_eq!(gate_report.results.len(), 1);
    }

    #[test]
    fn test_no_gates_pass() {
        let gate_report = QualityGateEvaluator::default().evaluate::<&str>(&report(), &[]);
        assert_eq!(gate_report, GateReport::default());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let evaluator =
            QualityGateEvaluator::default().with(Arc::new(AlwaysFails("test_coverage")));
        assert_eq!(
            evaluator.gate_names(),
            vec!["code_quality", "security_compliance", "test_coverage"]
        );
        let gate_report = evaluator.evaluate(&AggregatedReport::default(), &["test_coverage"]);
        assert!(!gate_report.passed);
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let mut config = GateConfig::default();
        config.code_quality.max_high_severity = 10;
        let evaluator = QualityGateEvaluator::new(&config);
        assert!(evaluator.evaluate(&report(), &["code_quality"]).passed);
    }
}
