//! The orchestrator facade.
//!
//! One entry point per request kind:
//! - [`Orchestrator::execute_workflow`]: select, execute, aggregate, gate
//! - [`Orchestrator::chat_with_agents`]: route a message and merge answers
//!
//! The registry, templates and gates are fixed at construction and shared
//! read-only by every request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arbiter_agents::{
    builtin, AgentContext, AgentRegistry, AgentStatsSnapshot, HeuristicDetector, HttpLlmClient,
    LlmClient, TechStackDetector,
};
use arbiter_chat::{ChatResponse, ChatRouter, ChatType};
use arbiter_core::{
    AgentSelector, AggregatedReport, ExecutionState, ResultAggregator, TemplateSet,
    WorkflowExecutor, WorkflowType,
};
use arbiter_policy::{GateReport, QualityGate, QualityGateEvaluator};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ArbiterConfig;
use crate::error::ArbiterResult;

fn secs<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

/// Outcome of one workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    pub workflow_type: WorkflowType,
    /// Gates passed and at least one agent succeeded
    pub success: bool,
    pub report: AggregatedReport,
    /// Key of every invoked agent, failed ones included
    pub agents_used: Vec<String>,
    #[serde(serialize_with = "secs")]
    pub execution_time: Duration,
    pub timestamp: DateTime<Utc>,
    /// Gate failures followed by agent failures
    pub errors: Vec<String>,
    pub gate_report: GateReport,
    pub state: ExecutionState,
    /// Wall-clock seconds per agent key
    pub timings: BTreeMap<String, f64>,
}

/// Entry point for workflow and chat requests.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    templates: TemplateSet,
    detector: Arc<dyn TechStackDetector>,
    selector: AgentSelector,
    executor: WorkflowExecutor,
    aggregator: ResultAggregator,
    gates: QualityGateEvaluator,
    router: ChatRouter,
}

impl Orchestrator {
    /// Orchestrator over `registry` with built-in templates and gates.
    pub fn new(registry: AgentRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            router: ChatRouter::new(Arc::clone(&registry)),
            registry,
            templates: TemplateSet::builtin(),
            detector: Arc::new(HeuristicDetector::new()),
            selector: AgentSelector::new(),
            executor: WorkflowExecutor::new(),
            aggregator: ResultAggregator::new(),
            gates: QualityGateEvaluator::default(),
        }
    }

    /// Orchestrator over `registry` configured by `config`.
    pub fn from_config(registry: AgentRegistry, config: &ArbiterConfig) -> ArbiterResult<Self> {
        config.validate()?;
        let mut orchestrator = Self::new(registry);
        orchestrator.templates = config.template_set()?;
        orchestrator.gates = QualityGateEvaluator::new(&config.gates);
        orchestrator.router = ChatRouter::new(Arc::clone(&orchestrator.registry))
            .with_keywords(config.chat.keyword_table())
            .with_timeout(config.chat.timeout());
        Ok(orchestrator)
    }

    /// Orchestrator with the built-in agents.
    ///
    /// Agents get an LLM client for chat when one is configured in the
    /// environment, and answer with canned text otherwise.
    pub fn builtin(config: &ArbiterConfig) -> ArbiterResult<Self> {
        let llm: Option<Arc<dyn LlmClient>> = match HttpLlmClient::from_env() {
            Ok(client) => {
                info!("Using LLM model {} for agent chat", client.model());
                Some(Arc::new(client))
            }
            Err(e) => {
                debug!("No LLM client: {}", e);
                None
            }
        };
        Self::from_config(builtin::default_registry(llm), config)
    }

    pub fn with_detector(mut self, detector: Arc<dyn TechStackDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Register an extra quality gate, replacing one with the same name.
    pub fn with_gate(mut self, gate: Arc<dyn QualityGate>) -> Self {
        self.gates.register(gate);
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Run a workflow against one file.
    ///
    /// Template lookup and agent selection failures abort before any agent
    /// runs. Agent failures are recorded in the result instead.
    pub async fn execute_workflow(
        &self,
        workflow_type: WorkflowType,
        path: &str,
        content: &str,
        context: Option<AgentContext>,
    ) -> ArbiterResult<WorkflowResult> {
        let run_id = Uuid::new_v4();
        let timestamp = Utc::now();
        info!("Starting {} workflow {} for {}", workflow_type, run_id, path);

        let template = self.templates.get(workflow_type).map_err(|e| {
            error!("Workflow {} aborted: {}", run_id, e);
            e
        })?;

        let stack = self.detector.detect(path, content);
        debug!(
            "Detected stack for {}: language={:?} framework={:?}",
            path, stack.language, stack.framework
        );

        let selection = self
            .selector
            .select(template, &stack, &self.registry)
            .map_err(|e| {
                error!("Workflow {} aborted: {}", run_id, e);
                e
            })?;

        let mut context = context.unwrap_or_default();
        if context.tech_stack.is_none() {
            context.tech_stack = Some(stack);
        }

        let outcome = self
            .executor
            .execute(&selection, template, path, content, &context)
            .await;
        let report = self.aggregator.combine(&outcome.results);
        let gate_report = self.gates.evaluate(&report, &template.quality_gates);

        let mut errors = gate_report.errors.clone();
        errors.extend(
            outcome
                .results
                .failures()
                .map(|(key, message)| format!("{}: {}", key, message)),
        );

        let any_succeeded = outcome.results.successes().next().is_some();
        if !any_succeeded {
            warn!("Every agent of workflow {} failed", run_id);
        }
        let success = gate_report.passed && any_succeeded;

        info!(
            "Finished {} workflow {} in {:.2}s (success={}, issues={})",
            workflow_type,
            run_id,
            outcome.elapsed.as_secs_f64(),
            success,
            report.issues.len()
        );

        Ok(WorkflowResult {
            run_id,
            workflow_type,
            success,
            agents_used: outcome.agents_used(),
            execution_time: outcome.elapsed,
            timestamp,
            errors,
            gate_report,
            state: outcome.state,
            timings: outcome
                .timings
                .iter()
                .map(|t| (t.key.clone(), t.elapsed.as_secs_f64()))
                .collect(),
            report,
        })
    }

    /// [`Self::execute_workflow`] with the workflow given by name.
    pub async fn execute_named_workflow(
        &self,
        workflow: &str,
        path: &str,
        content: &str,
        context: Option<AgentContext>,
    ) -> ArbiterResult<WorkflowResult> {
        let workflow_type: WorkflowType = workflow.parse()?;
        self.execute_workflow(workflow_type, path, content, context)
            .await
    }

    /// Ask the relevant agents about `message`.
    ///
    /// `chat_type` is one of `code`, `analysis` or `general`.
    pub async fn chat_with_agents(
        &self,
        message: &str,
        chat_type: &str,
        context: Option<AgentContext>,
    ) -> ArbiterResult<ChatResponse> {
        let chat_type: ChatType = chat_type.parse()?;
        Ok(self.router.chat(message, chat_type, context).await?)
    }

    /// Usage counters of every registered agent, keyed like result slots.
    pub fn agent_stats(&self) -> BTreeMap<String, AgentStatsSnapshot> {
        let mut stats = BTreeMap::new();
        for category in self.registry.categories() {
            for agent in self.registry.agents(category) {
                stats.insert(
                    arbiter_core::agent_key(category, agent.name()),
                    agent.stats(),
                );
            }
        }
        stats
    }
}
