//! Workflow executor: runs a selection of agents against one file.
//!
//! Every agent invocation runs in its own tokio task under the template's
//! per-agent deadline. Errors, timeouts and panics are recorded in that
//! agent's slot; they never abort the run.
//!
//! - **Parallel**: all tasks are spawned up front and joined with
//!   [`join_all`] in selection order.
//! - **Sequential**: one task at a time; each agent sees the slots filled so
//!   far as [`AgentContext::previous_results`].
//!
//! Either way the result holds exactly one slot per selected agent, in
//! selection order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arbiter_agents::{
    AgentContext, AgentError, AgentFailure, AgentOutcome, AgentResults, FailureKind,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::selector::{SelectedAgent, Selection};
use crate::template::WorkflowTemplate;

/// How a completed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Every slot succeeded
    Full,
    /// At least one slot holds a failure
    Partial,
}

/// Lifecycle of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "state", content = "completion")]
pub enum ExecutionState {
    #[default]
    NotStarted,
    AgentsSelected,
    Executing,
    Completed(Completion),
}

impl ExecutionState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_advance_to(&self, next: ExecutionState) -> bool {
        matches!(
            (self, next),
            (ExecutionState::NotStarted, ExecutionState::AgentsSelected)
                | (ExecutionState::AgentsSelected, ExecutionState::Executing)
                | (ExecutionState::Executing, ExecutionState::Completed(_))
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionState::Completed(_))
    }
}

/// Wall-clock time one agent took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTiming {
    pub key: String,
    pub elapsed: Duration,
}

/// Output of one executor run.
///
/// Timings are kept apart from `results` so that result content does not
/// depend on scheduling.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub results: AgentResults,
    pub timings: Vec<AgentTiming>,
    pub elapsed: Duration,
    pub state: ExecutionState,
}

impl ExecutionOutcome {
    /// Keys of every invoked agent, in selection order.
    pub fn agents_used(&self) -> Vec<String> {
        self.results.keys().map(str::to_string).collect()
    }
}

/// Runs selected agents according to a template.
#[derive(Debug, Default, Clone)]
pub struct WorkflowExecutor;

impl WorkflowExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run every selected agent once.
    pub async fn execute(
        &self,
        selection: &Selection,
        template: &WorkflowTemplate,
        path: &str,
        content: &str,
        context: &AgentContext,
    ) -> ExecutionOutcome {
        let started = Instant::now();
        let mut state = ExecutionState::AgentsSelected;
        Self::advance(&mut state, ExecutionState::Executing);

        info!(
            "Executing {} agents ({}) for {}",
            selection.len(),
            if template.parallel { "parallel" } else { "sequential" },
            path
        );

        let input = Input {
            path: Arc::from(path),
            content: Arc::from(content),
            limit: template.max_execution_time,
        };

        let (results, timings) = if template.parallel {
            Self::run_parallel(selection, &input, context).await
        } else {
            Self::run_sequential(selection, &input, context).await
        };

        let completion = if results.failures().next().is_none() {
            Completion::Full
        } else {
            Completion::Partial
        };
        Self::advance(&mut state, ExecutionState::Completed(completion));

        let elapsed = started.elapsed();
        info!(
            "Executed {} agents in {:.2}s ({:?})",
            results.len(),
            elapsed.as_secs_f64(),
            completion
        );

        ExecutionOutcome {
            results,
            timings,
            elapsed,
            state,
        }
    }

    fn advance(state: &mut ExecutionState, next: ExecutionState) {
        debug_assert!(state.can_advance_to(next), "{:?} -> {:?}", state, next);
        debug!("Execution state {:?} -> {:?}", state, next);
        *state = next;
    }

    async fn run_parallel(
        selection: &Selection,
        input: &Input,
        context: &AgentContext,
    ) -> (AgentResults, Vec<AgentTiming>) {
        let handles: Vec<_> = selection
            .iter()
            .map(|selected| spawn_agent(selected, input, context.clone()))
            .collect();

        let joined = join_all(handles).await;

        let mut results = AgentResults::new();
        let mut timings = Vec::with_capacity(selection.len());
        for (selected, joined) in selection.iter().zip(joined) {
            let (outcome, elapsed) = settle(selected, joined);
            results.insert(selected.key.clone(), outcome);
            timings.push(AgentTiming {
                key: selected.key.clone(),
                elapsed,
            });
        }
        (results, timings)
    }

    async fn run_sequential(
        selection: &Selection,
        input: &Input,
        context: &AgentContext,
    ) -> (AgentResults, Vec<AgentTiming>) {
        let mut results = AgentResults::new();
        let mut timings = Vec::with_capacity(selection.len());

        for selected in selection {
            let step_context = context.clone().with_previous_results(results.clone());
            let joined = spawn_agent(selected, input, step_context).await;
            let (outcome, elapsed) = settle(selected, joined);
            results.insert(selected.key.clone(), outcome);
            timings.push(AgentTiming {
                key: selected.key.clone(),
                elapsed,
            });
        }
        (results, timings)
    }
}

/// Shared, cheaply clonable input of one run.
struct Input {
    path: Arc<str>,
    content: Arc<str>,
    limit: Duration,
}

type AgentRun = (AgentOutcome, Duration);

fn spawn_agent(
    selected: &SelectedAgent,
    input: &Input,
    context: AgentContext,
) -> JoinHandle<AgentRun> {
    let agent = Arc::clone(&selected.agent);
    let key = selected.key.clone();
    let path = Arc::clone(&input.path);
    let content = Arc::clone(&input.content);
    let limit = input.limit;

    tokio::spawn(async move {
        let started = Instant::now();
        debug!("Starting agent {}", key);
        let run = agent.analyze(&path, &content, &context);
        let outcome = match tokio::time::timeout(limit, run).await {
            Ok(Ok(result)) => AgentOutcome::Success(result),
            Ok(Err(e)) => {
                warn!("Agent {} failed: {}", key, e);
                AgentOutcome::from(Err(e))
            }
            Err(_) => {
                let e = AgentError::timeout(agent.name(), limit);
                warn!("{}", e);
                AgentOutcome::from(Err(e))
            }
        };
        (outcome, started.elapsed())
    })
}

/// Turn a joined task into a slot, recording panics as failures.
fn settle(selected: &SelectedAgent, joined: Result<AgentRun, JoinError>) -> AgentRun {
    match joined {
        Ok(run) => run,
        Err(e) => {
            let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
            let message = format!("Agent {} {}", selected.agent.name(), reason);
            warn!("{}", message);
            (
                AgentOutcome::Failure(AgentFailure::new(FailureKind::Panicked, message)),
                Duration::ZERO,
            )
        }
    }
}
