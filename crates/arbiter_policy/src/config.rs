//! Gate thresholds.

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// Settings for the `code_quality` gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeQualityConfig {
    /// Highest number of `high` severity issues that still passes
    pub max_high_severity: usize,
}

impl Default for CodeQualityConfig {
    fn default() -> Self {
        Self {
            max_high_severity: 5,
        }
    }
}

/// Settings for the `security_compliance` gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityComplianceConfig {
    /// Issue types that fail the gate at any severity
    pub blocked_types: Vec<String>,
}

impl Default for SecurityComplianceConfig {
    fn default() -> Self {
        Self {
            blocked_types: vec!["security".to_string(), "vulnerability".to_string()],
        }
    }
}

/// Thresholds of all built-in gates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub code_quality: CodeQualityConfig,
    pub security_compliance: SecurityComplianceConfig,
}

impl GateConfig {
    /// Parse from YAML, falling back to defaults for missing keys.
    pub fn from_yaml(yaml: &str) -> PolicyResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PolicyResult<()> {
        if self
            .security_compliance
            .blocked_types
            .iter()
            .any(|t| t.trim().is_empty())
        {
            return Err(PolicyError::invalid(
                "security_compliance",
                "blocked_types must not contain empty entries",
            ));
        }
        Ok(())
    }
}
