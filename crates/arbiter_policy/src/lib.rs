//! # arbiter_policy
//!
//! Quality gates for Arbiter reports.
//!
//! A gate is a named, pure predicate over an [`AggregatedReport`]. Workflow
//! templates list gate names; the [`QualityGateEvaluator`] runs the known
//! ones and ignores the rest.
//!
//! Built-in gates:
//! - `code_quality`: at most `max_high_severity` issues of severity `high`
//! - `security_compliance`: no issue of a blocked type
//! - `test_coverage`: always passes until coverage is measured
//!
//! [`AggregatedReport`]: arbiter_core::AggregatedReport

pub mod config;
pub mod error;
pub mod evaluator;
pub mod gate;

pub use config::{CodeQualityConfig, GateConfig, SecurityComplianceConfig};
pub use error::{PolicyError, PolicyResult};
pub use evaluator::{GateReport, QualityGateEvaluator};
pub use gate::{CodeQualityGate, GateResult, QualityGate, SecurityComplianceGate, TestCoverageGate};
