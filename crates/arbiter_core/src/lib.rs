//! # arbiter_core
//!
//! Selection, execution and aggregation engine for Arbiter.
//!
//! # Architecture
//!
//! - **Templates**: per-workflow categories, execution mode, deadline, gates
//! - **Selector**: picks one agent per category from the registry
//! - **Executor**: runs the selection in parallel or as a pipeline
//! - **Aggregator**: merges slots into one report
//!
//! # Example
//!
//! ```rust,ignore
//! use arbiter_agents::{builtin, HeuristicDetector, TechStackDetector, AgentContext};
//! use arbiter_core::{
//!     AgentSelector, ResultAggregator, TemplateSet, WorkflowExecutor, WorkflowType,
//! };
//!
//! let registry = builtin::default_registry(None);
//! let templates = TemplateSet::builtin();
//! let template = templates.get(WorkflowType::CodeDevelopment)?;
//!
//! let stack = HeuristicDetector::new().detect(path, content);
//! let selection = AgentSelector::new().select(template, &stack, &registry)?;
//! let outcome = WorkflowExecutor::new()
//!     .execute(&selection, template, path, content, &AgentContext::new())
//!     .await;
//! let report = ResultAggregator::new().combine(&outcome.results);
//! ```

pub mod aggregator;
pub mod error;
pub mod executor;
pub mod report;
pub mod selector;
pub mod template;

pub use aggregator::ResultAggregator;
pub use error::{CoreError, CoreResult};
pub use executor::{AgentTiming, Completion, ExecutionOutcome, ExecutionState, WorkflowExecutor};
pub use report::{AggregatedReport, CategoryView};
pub use selector::{agent_key, AgentSelector, MatchKind, SelectedAgent, Selection};
pub use template::{TemplateSet, WorkflowTemplate, WorkflowType};
