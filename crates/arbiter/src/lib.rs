//! # arbiter
//!
//! Agent orchestration engine.
//!
//! A request names a workflow and a file. The [`Orchestrator`] detects the
//! file's stack, picks one agent per category the workflow needs, runs them
//! in parallel or as a pipeline under a per-agent deadline, merges their
//! findings into one report and evaluates the workflow's quality gates.
//! Agent failures never abort a run; they are recorded next to the results.
//!
//! ## Example
//!
//! ```rust,ignore
//! use arbiter::{ArbiterConfig, Orchestrator, WorkflowType};
//!
//! let config = ArbiterConfig::from_env()?;
//! arbiter::telemetry::init_tracing(&config.telemetry);
//!
//! let orchestrator = Orchestrator::builtin(&config)?;
//! let result = orchestrator
//!     .execute_workflow(WorkflowType::FullAnalysis, "src/App.jsx", source, None)
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```
//!
//! ## Crates
//!
//! - [`arbiter_agents`]: agent contract, registry, built-in agents
//! - [`arbiter_core`]: templates, selection, execution, aggregation
//! - [`arbiter_policy`]: quality gates
//! - [`arbiter_chat`]: chat routing

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod telemetry;

pub use config::{ArbiterConfig, ChatConfig, LogFormat, TelemetryConfig};
pub use error::{ArbiterError, ArbiterResult};
pub use orchestrator::{Orchestrator, WorkflowResult};

pub use arbiter_agents::{AgentContext, AgentRegistry, Category};
pub use arbiter_chat::{ChatResponse, ChatType};
pub use arbiter_core::{AggregatedReport, WorkflowType};
pub use arbiter_policy::{GateConfig, GateReport};
