//! Workflow types and their templates.
//!
//! A template says which agent categories run for a workflow, whether they
//! run concurrently, the per-agent deadline and which quality gates apply.
//! Templates are immutable once loaded.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use arbiter_agents::Category;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Closed set of workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    CodeDevelopment,
    TestingAnalysis,
    SecurityAudit,
    FullAnalysis,
    ChatAssistance,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::CodeDevelopment => "code_development",
            WorkflowType::TestingAnalysis => "testing_analysis",
            WorkflowType::SecurityAudit => "security_audit",
            WorkflowType::FullAnalysis => "full_analysis",
            WorkflowType::ChatAssistance => "chat_assistance",
        }
    }

    pub fn all() -> [WorkflowType; 5] {
        [
            WorkflowType::CodeDevelopment,
            WorkflowType::TestingAnalysis,
            WorkflowType::SecurityAudit,
            WorkflowType::FullAnalysis,
            WorkflowType::ChatAssistance,
        ]
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|w| w.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownWorkflow(s.to_string()))
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_f64(value.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(serde::de::Error::custom(format!(
                "max_execution_time must be a positive number of seconds, got {}",
                secs
            )));
        }
        Duration::try_from_secs_f64(secs).map_err(|e| {
            serde::de::Error::custom(format!("max_execution_time of {}s: {}", secs, e))
        })
    }
}

fn default_parallel() -> bool {
    true
}

fn default_max_execution_time() -> Duration {
    Duration::from_secs(30)
}

/// One workflow configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    #[serde(default)]
    pub required_categories: Vec<Category>,
    #[serde(default)]
    pub optional_categories: Vec<Category>,
    /// Fan out concurrently (`true`) or run as a pipeline (`false`)
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Deadline for each agent invocation
    #[serde(with = "duration_secs", default = "default_max_execution_time")]
    pub max_execution_time: Duration,
    #[serde(default)]
    pub quality_gates: Vec<String>,
}

impl Default for WorkflowTemplate {
    fn default() -> Self {
        Self {
            required_categories: Vec::new(),
            optional_categories: Vec::new(),
            parallel: default_parallel(),
            max_execution_time: default_max_execution_time(),
            quality_gates: Vec::new(),
        }
    }
}

impl WorkflowTemplate {
    pub fn new(required: impl IntoIterator<Item = Category>) -> Self {
        Self {
            required_categories: required.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn optional(mut self, optional: impl IntoIterator<Item = Category>) -> Self {
        self.optional_categories = optional.into_iter().collect();
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn max_execution_time(mut self, limit: Duration) -> Self {
        self.max_execution_time = limit;
        self
    }

    pub fn gates<I, S>(mut self, gates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quality_gates = gates.into_iter().map(Into::into).collect();
        self
    }

    /// Categories to select from, required first, each at most once.
    ///
    /// The flag is `true` for required categories. A category listed as both
    /// required and optional counts as required.
    pub fn categories(&self) -> Vec<(Category, bool)> {
        let mut seen: Vec<(Category, bool)> = Vec::new();
        let listed = self
            .required_categories
            .iter()
            .map(|c| (*c, true))
            .chain(self.optional_categories.iter().map(|c| (*c, false)));
        for (category, required) in listed {
            if !seen.iter().any(|(c, _)| *c == category) {
                seen.push((category, required));
            }
        }
        seen
    }

    /// Reject templates that could never run.
    pub fn validate(&self, name: &str) -> CoreResult<()> {
        if self.max_execution_time.is_zero() {
            return Err(CoreError::invalid_template(
                name,
                "max_execution_time must be positive",
            ));
        }
        if self.required_categories.is_empty() && self.optional_categories.is_empty() {
            return Err(CoreError::invalid_template(name, "no agent categories"));
        }
        Ok(())
    }
}

/// Templates keyed by workflow type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSet {
    templates: BTreeMap<WorkflowType, WorkflowTemplate>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    /// An empty set.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// The five built-in workflows.
    pub fn builtin() -> Self {
        use Category::{Code, Security, Testing};

        Self::empty()
            .with(
                WorkflowType::CodeDevelopment,
                WorkflowTemplate::new([Code])
                    .optional([Testing])
                    .max_execution_time(Duration::from_secs(30))
                    .gates(["code_quality"]),
            )
            .with(
                WorkflowType::TestingAnalysis,
                WorkflowTemplate::new([Testing])
                    .optional([Code])
                    .parallel(false)
                    .max_execution_time(Duration::from_secs(45))
                    .gates(["test_coverage"]),
            )
            .with(
                WorkflowType::SecurityAudit,
                WorkflowTemplate::new([Security])
                    .optional([Code])
                    .max_execution_time(Duration::from_secs(60))
                    .gates(["security_compliance"]),
            )
            .with(
                WorkflowType::FullAnalysis,
                WorkflowTemplate::new([Code, Testing, Security])
                    .max_execution_time(Duration::from_secs(120))
                    .gates(["code_quality", "security_compliance", "test_coverage"]),
            )
            .with(
                WorkflowType::ChatAssistance,
                WorkflowTemplate::new([Code])
                    .optional([Testing, Security])
                    .max_execution_time(Duration::from_secs(30)),
            )
    }

    pub fn with(mut self, workflow: WorkflowType, template: WorkflowTemplate) -> Self {
        self.insert(workflow, template);
        self
    }

    pub fn insert(&mut self, workflow: WorkflowType, template: WorkflowTemplate) {
        self.templates.insert(workflow, template);
    }

    /// Look up a template.
    pub fn get(&self, workflow: WorkflowType) -> CoreResult<&WorkflowTemplate> {
        self.templates
            .get(&workflow)
            .ok_or_else(|| CoreError::TemplateNotFound(workflow.to_string()))
    }

    /// Replace templates by workflow name.
    ///
    /// Every override is validated before any of them is applied.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, WorkflowTemplate>,
    ) -> CoreResult<()> {
        let mut parsed = Vec::with_capacity(overrides.len());
        for (name, template) in overrides {
            let workflow: WorkflowType = name.parse()?;
            template.validate(name)?;
            parsed.push((workflow, template.clone()));
        }
        for (workflow, template) in parsed {
            debug!("Overriding template for {}", workflow);
            self.insert(workflow, template);
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WorkflowType, &WorkflowTemplate)> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_type_names() {
        for workflow in WorkflowType::all() {
            assert_eq!(workflow.as_str().parse::<WorkflowType>().unwrap(), workflow);
        }
        let err = "deploy".parse::<WorkflowType>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownWorkflow(name) if name == "deploy"));
    }

    #[test]
    fn test_builtin_templates() {
        let set = TemplateSet::builtin();
        assert_eq!(set.len(), 5);

        let testing = set.get(WorkflowType::TestingAnalysis).unwrap();
        assert!(!testing.parallel);
        assert_eq!(testing.max_execution_time, Duration::from_secs(45));
        assert_eq!(testing.quality_gates, vec!["test_coverage"]);

        let full = set.get(WorkflowType::FullAnalysis).unwrap();
        assert_eq!(full.categories().len(), 3);
        assert!(full.optional_categories.is_empty());

        let chat = set.get(WorkflowType::ChatAssistance).unwrap();
        assert!(chat.quality_gates.is_empty());
    }

    #[test]
    fn test_categories_are_deduplicated() {
        let template = WorkflowTemplate::new([Category::Code, Category::Code])
            .optional([Category::Testing, Category::Code]);
        assert_eq!(
            template.categories(),
            vec![(Category::Code, true), (Category::Testing, false)]
        );
    }

    #[test]
    fn test_missing_template() {
        let set = TemplateSet::empty();
        assert!(matches!(
            set.get(WorkflowType::SecurityAudit),
            Err(CoreError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_template_yaml_uses_seconds() {
        let yaml = "required_categories: [testing]\noptional_categories: [code]\nparallel: false\nmax_execution_time: 1.5\n";
        let template: WorkflowTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(template.max_execution_time, Duration::from_millis(1500));
        assert!(template.quality_gates.is_empty());

        let json = serde_json::to_value(WorkflowTemplate::new([Category::Code])).unwrap();
        assert_eq!(json["max_execution_time"], 30);
    }

    #[test]
    fn test_zero_deadline_rejected() {
        let result: Result<WorkflowTemplate, _> =
            serde_yaml::from_str("required_categories: [code]\nmax_execution_time: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_overflowing_deadline_rejected() {
        let result: Result<WorkflowTemplate, _> =
            serde_yaml::from_str("required_categories: [code]\nmax_execution_time: 1e20\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("max_execution_time"), "{}", err);
    }

    #[test]
    fn test_apply_overrides() {
        let mut set = TemplateSet::builtin();
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "security_audit".to_string(),
            WorkflowTemplate::new([Category::Security]).max_execution_time(Duration::from_secs(5)),
        );
        set.apply_overrides(&overrides).unwrap();
        assert_eq!(
            set.get(WorkflowType::SecurityAudit).unwrap().max_execution_time,
            Duration::from_secs(5)
        );

        overrides.insert("nightly".to_string(), WorkflowTemplate::new([Category::Code]));
        assert!(set.apply_overrides(&overrides).is_err());
    }
}
