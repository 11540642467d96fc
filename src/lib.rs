//! # Chainflow — a steppable workflow execution engine
//!
//! `chainflow` executes node-based LLM workflows: directed-acyclic graphs of
//! draggable editor nodes (input, llm, if, loop, variable, combine, output)
//! wired together by port-to-port connections. The engine is the part of the
//! system with real invariants:
//!
//! - **Deterministic ordering**: Kahn's algorithm with a stable,
//!   document-order tie-break, so identical inputs always produce identical
//!   run order.
//! - **Pre-flight validation**: dangling connection endpoints and cycles fail
//!   the run before any node executes.
//! - **Steppable execution**: a pull-based iterator yields one step per
//!   [`WorkflowExecutor::next`] call, so a UI can pause between nodes and
//!   show progress without the engine owning UI timing.
//! - **Cooperative cancellation**: [`WorkflowExecutor::stop`] halts the run
//!   at the next step boundary; already-computed outputs stay inspectable.
//! - **Branch and bounded-loop semantics**: the `if` node's dual pass-through
//!   outputs and the `loop` node's iteration cap, each with variable-compare
//!   and LLM-judgment condition modes.
//!
//! Node behaviors live behind the [`NodeExecutor`] trait and are looked up in
//! a [`NodeRegistry`] by type string; the core never matches on node types it
//! does not define. External collaborators — the LLM provider
//! ([`LlmClient`]) and the run-history store ([`RunStore`]) — are trait
//! objects too: the provider's failure fails the calling node, the store's
//! failure never fails the run.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use chainflow::{default_registry, OpenAiClient, StepEvent, WorkflowExecutor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc: chainflow::WorkflowDocument =
//!         serde_json::from_str(&std::fs::read_to_string("workflow.json")?)?;
//!     let registry = Arc::new(default_registry(Arc::new(OpenAiClient::new()))?);
//!     let mut executor = WorkflowExecutor::start(
//!         doc.nodes,
//!         doc.connections,
//!         HashMap::new(),
//!         registry,
//!     )?;
//!     loop {
//!         let event = executor.next().await;
//!         println!("{:?}", event);
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod dsl;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod graph;
pub mod history;
pub mod llm;
pub mod nodes;
pub mod router;

pub use crate::context::{ExecutionContext, LogEntry, LogLevel};
pub use crate::dsl::{Connection, Endpoint, WorkflowDocument, WorkflowNode};
pub use crate::error::{NodeError, WorkflowError};
pub use crate::executor::{RunState, StepEvent, StopSignal, WorkflowExecutor};
pub use crate::graph::{build_graph, resolve_order, WorkflowGraph};
pub use crate::history::{MemoryRunStore, NodeLogRecord, RunStore, StoreError};
pub use crate::llm::{LlmCallOptions, LlmClient, LlmError, OpenAiClient};
pub use crate::nodes::{default_registry, BranchOutput, NodeDefinition, NodeExecutor, NodeRegistry};
