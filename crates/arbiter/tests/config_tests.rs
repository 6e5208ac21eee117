//! Loading configuration files from disk.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use arbiter::{ArbiterConfig, ArbiterError, LogFormat, WorkflowType};
use tempfile::{Builder, NamedTempFile};

fn write_config(suffix: &str, content: &str) -> Result<NamedTempFile> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    file.write_all(content.as_bytes())?;
    Ok(file)
}

#[test]
fn test_load_yaml() -> Result<()> {
    let file = write_config(
        ".yaml",
        r#"
templates:
  testing_analysis:
    required_categories: [testing]
    optional_categories: [code]
    parallel: true
    max_execution_time: 2.5
gates:
  security_compliance:
    blocked_types: [vulnerability]
chat:
  timeout_secs: 5
  keywords:
    vue: [vue, pinia]
telemetry:
  format: json
"#,
    )?;

    let config = ArbiterConfig::load(file.path())?;
    assert_eq!(config.chat.timeout(), Duration::from_secs(5));
    assert_eq!(config.telemetry.format, LogFormat::Json);
    assert_eq!(
        config.gates.security_compliance.blocked_types,
        vec!["vulnerability"]
    );

    let templates = config.template_set()?;
    let testing = templates.get(WorkflowType::TestingAnalysis)?;
    assert!(testing.parallel);
    assert_eq!(testing.max_execution_time, Duration::from_millis(2500));
    assert!(config.chat.keyword_table().matches("vue_code", "Pinia store"));
    Ok(())
}

#[test]
fn test_load_toml() -> Result<()> {
    let file = write_config(
        ".toml",
        r#"
[templates.full_analysis]
required_categories = ["code", "security"]
max_execution_time = 10
quality_gates = ["security_compliance"]

[gates.code_quality]
max_high_severity = 0

[telemetry]
filter = "arbiter=debug"
"#,
    )?;

    let config = ArbiterConfig::load(file.path())?;
    assert_eq!(config.gates.code_quality.max_high_severity, 0);
    assert_eq!(config.telemetry.filter.as_deref(), Some("arbiter=debug"));

    let templates = config.template_set()?;
    let full = templates.get(WorkflowType::FullAnalysis)?;
    assert_eq!(full.max_execution_time, Duration::from_secs(10));
    assert_eq!(full.quality_gates, vec!["security_compliance"]);
    assert!(full.parallel);
    Ok(())
}

#[test]
fn test_empty_yaml_is_default() -> Result<()> {
    let file = write_config(".yml", "{}\n")?;
    assert_eq!(ArbiterConfig::load(file.path())?, ArbiterConfig::default());
    Ok(())
}

#[test]
fn test_rejects_bad_files() -> Result<()> {
    let file = write_config(".json", "{}")?;
    assert!(matches!(
        ArbiterConfig::load(file.path()),
        Err(ArbiterError::UnsupportedConfigFormat(_))
    ));

    let file = write_config(
        ".yaml",
        "templates:\n  code_development:\n    required_categories: [code]\n    max_execution_time: 0\n",
    )?;
    assert!(matches!(
        ArbiterConfig::load(file.path()),
        Err(ArbiterError::Yaml(_))
    ));

    let file = write_config(
        ".yaml",
        "gates:\n  security_compliance:\n    blocked_types: ['']\n",
    )?;
    assert!(matches!(
        ArbiterConfig::load(file.path()),
        Err(ArbiterError::Policy(_))
    ));

    let missing = tempfile::tempdir()?.path().join("arbiter.yaml");
    assert!(matches!(
        ArbiterConfig::load(&missing),
        Err(ArbiterError::Io(_))
    ));
    Ok(())
}
