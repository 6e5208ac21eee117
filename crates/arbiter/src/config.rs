//! Orchestrator configuration.
//!
//! Loaded from a YAML or TOML file, chosen by extension. Every section has
//! defaults, so an empty file is a valid configuration.
//!
//! ```yaml
//! templates:
//!   security_audit:
//!     required_categories: [security]
//!     parallel: false
//!     max_execution_time: 90
//!     quality_gates: [security_compliance]
//! gates:
//!   code_quality:
//!     max_high_severity: 2
//! chat:
//!   timeout_secs: 20
//!   keywords:
//!     rust: [cargo, borrow]
//! telemetry:
//!   format: json
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use arbiter_chat::{KeywordTable, DEFAULT_CHAT_TIMEOUT};
use arbiter_core::{TemplateSet, WorkflowTemplate};
use arbiter_policy::GateConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ArbiterError, ArbiterResult};

/// Environment variable holding the config file path.
pub const CONFIG_ENV: &str = "ARBITER_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// Template overrides keyed by workflow name
    pub templates: BTreeMap<String, WorkflowTemplate>,
    pub gates: GateConfig,
    pub chat: ChatConfig,
    pub telemetry: TelemetryConfig,
}

/// Chat routing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Per-agent chat deadline in seconds
    pub timeout_secs: u64,
    /// Extra keywords per technology, merged into the built-in table
    pub keywords: BTreeMap<String, Vec<String>>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_CHAT_TIMEOUT.as_secs(),
            keywords: BTreeMap::new(),
        }
    }
}

impl ChatConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> ArbiterResult<()> {
        if self.timeout_secs == 0 {
            return Err(ArbiterError::InvalidConfig(
                "chat.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in keyword table extended with the configured keywords.
    pub fn keyword_table(&self) -> KeywordTable {
        let mut table = KeywordTable::builtin();
        for (technology, words) in &self.keywords {
            table.extend(technology, words);
        }
        table
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset
    pub filter: Option<String>,
}

impl ArbiterConfig {
    /// Load from a `.yaml`, `.yml` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> ArbiterResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let content = std::fs::read_to_string(path)?;
        let config: Self = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => return Err(ArbiterError::UnsupportedConfigFormat(path.to_path_buf())),
        };
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the file named by `ARBITER_CONFIG`, or use defaults when it
    /// is unset.
    pub fn from_env() -> ArbiterResult<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => {
                debug!("{} not set, using default configuration", CONFIG_ENV);
                Ok(Self::default())
            }
        }
    }

    /// Check gate thresholds, the chat deadline and template overrides.
    pub fn validate(&self) -> ArbiterResult<()> {
        self.gates.validate()?;
        self.chat.validate()?;
        self.template_set()?;
        Ok(())
    }

    /// Built-in templates with this config's overrides applied.
    pub fn template_set(&self) -> ArbiterResult<TemplateSet> {
        let mut templates = TemplateSet::builtin();
        templates.apply_overrides(&self.templates)?;
        Ok(templates)
    }
}
