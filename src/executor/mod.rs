//! The steppable workflow executor.
//!
//! One [`WorkflowExecutor`] drives one run. Construction via
//! [`WorkflowExecutor::start`] performs all graph validation up front;
//! [`WorkflowExecutor::next`] then executes exactly one node per call and
//! returns a [`StepEvent`], so the embedder controls pacing. Terminal
//! events are absorbing: once the run completes, fails, or is stopped,
//! further `next` calls replay the terminal event and execute nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::{Connection, WorkflowNode};
use crate::error::WorkflowError;
use crate::graph::{build_graph, resolve_order};
use crate::history::{NodeLogRecord, RunStore};
use crate::nodes::NodeRegistry;
use crate::router::collect_inputs;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
    Failed,
    Stopped,
}

/// One step's outcome, yielded by [`WorkflowExecutor::next`].
#[derive(Debug, Clone)]
pub enum StepEvent {
    /// A node executed successfully; the run continues.
    Running {
        node_id: String,
        result: Value,
        variables: Value,
    },
    /// Every node has executed.
    Completed { variables: Value },
    /// A node failed; the run is over.
    Failed { node_id: String, error: String },
    /// The run was stopped before this step.
    Stopped,
}

impl StepEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepEvent::Running { .. })
    }
}

/// Cloneable stop handle for a run.
///
/// Stopping is cooperative: the flag is checked at the next step boundary,
/// the node in flight (if any) finishes first.
#[derive(Clone, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Executes one workflow run, one node per [`next`](Self::next) call.
pub struct WorkflowExecutor {
    nodes: Vec<WorkflowNode>,
    connections: Vec<Connection>,
    /// Document indices in execution order.
    order: Vec<usize>,
    registry: Arc<NodeRegistry>,
    context: ExecutionContext,
    cursor: usize,
    state: RunState,
    stop: StopSignal,
    store: Option<Arc<dyn RunStore>>,
    workflow_id: String,
    run_id: Option<String>,
    run_create_attempted: bool,
    initial_inputs: Value,
    /// Set when the run failed, replayed by subsequent `next` calls.
    failure: Option<(String, String)>,
}

impl std::fmt::Debug for WorkflowExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutor")
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .field("order", &self.order)
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .field("workflow_id", &self.workflow_id)
            .field("run_id", &self.run_id)
            .field("run_create_attempted", &self.run_create_attempted)
            .field("initial_inputs", &self.initial_inputs)
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl WorkflowExecutor {
    /// Validate the workflow and prepare a run.
    ///
    /// Fails without executing anything when the document has duplicate
    /// node ids, references unregistered node types, has connections to
    /// unknown nodes, or contains a cycle.
    pub fn start(
        nodes: Vec<WorkflowNode>,
        connections: Vec<Connection>,
        initial_variables: HashMap<String, Value>,
        registry: Arc<NodeRegistry>,
    ) -> Result<Self, WorkflowError> {
        let mut seen = std::collections::HashSet::new();
        for node in &nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(WorkflowError::DuplicateNodeId(node.id.clone()));
            }
            if registry.get(&node.node_type).is_none() {
                return Err(WorkflowError::ExecutorNotFound(node.node_type.clone()));
            }
        }

        let graph = build_graph(&nodes, &connections)?;
        let order = resolve_order(&graph, &nodes)?;

        let initial_inputs = Value::Object(
            initial_variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );
        let mut context = ExecutionContext::new(initial_variables);
        context.log(
            LogLevel::Info,
            format!(
                "run ready: {} nodes, {} connections",
                nodes.len(),
                connections.len()
            ),
            None,
            None,
        );

        Ok(WorkflowExecutor {
            nodes,
            connections,
            order,
            registry,
            context,
            cursor: 0,
            state: RunState::Running,
            stop: StopSignal::new(),
            store: None,
            workflow_id: String::new(),
            run_id: None,
            run_create_attempted: false,
            initial_inputs,
            failure: None,
        })
    }

    /// Attach a run-history store. Persistence is best-effort: store
    /// failures are logged and never affect the run.
    pub fn with_run_store(mut self, store: Arc<dyn RunStore>, workflow_id: &str) -> Self {
        self.store = Some(store);
        self.workflow_id = workflow_id.to_string();
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// The run's failure as a typed error, `None` unless the run is in the
    /// `Failed` state.
    pub fn failure(&self) -> Option<WorkflowError> {
        self.failure
            .as_ref()
            .map(|(node_id, error)| WorkflowError::NodeExecution {
                node_id: node_id.clone(),
                error: error.clone(),
            })
    }

    /// The run's execution context: variables, node outputs, run log.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// A cloneable handle for stopping this run from elsewhere.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Request a cooperative stop at the next step boundary.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Execute the next node and return its step event.
    pub async fn next(&mut self) -> StepEvent {
        match self.state {
            RunState::Completed => {
                return StepEvent::Completed {
                    variables: self.context.variables_snapshot(),
                }
            }
            RunState::Failed => {
                let (node_id, error) = self
                    .failure
                    .clone()
                    .unwrap_or_else(|| (String::new(), "unknown failure".to_string()));
                return StepEvent::Failed { node_id, error };
            }
            RunState::Stopped => return StepEvent::Stopped,
            RunState::Running => {}
        }

        if self.stop.is_stopped() {
            self.state = RunState::Stopped;
            self.context
                .log(LogLevel::Info, "run stopped by request", None, None);
            self.push_run_update(json!({"status": "stopped"}));
            return StepEvent::Stopped;
        }

        self.ensure_run().await;

        if self.cursor >= self.order.len() {
            self.state = RunState::Completed;
            self.context
                .log(LogLevel::Info, "run completed", None, None);
            self.push_run_update(json!({
                "status": "completed",
                "outputs": self.context.node_outputs(),
            }));
            return StepEvent::Completed {
                variables: self.context.variables_snapshot(),
            };
        }

        let node = self.nodes[self.order[self.cursor]].clone();
        self.cursor += 1;

        let inputs = collect_inputs(
            &node,
            &self.nodes,
            &self.connections,
            &self.registry,
            &mut self.context,
        );
        let inputs_value = Value::Object(
            inputs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        // Registered types were checked at start.
        let Some(executor) = self.registry.get(&node.node_type).map(|d| d.executor.clone())
        else {
            let error = format!("node executor not found for type: {}", node.node_type);
            self.state = RunState::Failed;
            self.failure = Some((node.id.clone(), error.clone()));
            return StepEvent::Failed {
                node_id: node.id,
                error,
            };
        };

        let started = Instant::now();
        let result = executor.execute(&node, &inputs, &mut self.context).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                self.context.record_output(&node.id, result.clone());
                self.context.log(
                    LogLevel::Info,
                    format!("node '{}' completed in {}ms", node.label(), elapsed_ms),
                    Some(node.id.as_str()),
                    None,
                );
                self.push_node_log(NodeLogRecord {
                    run_id: self.run_id.clone().unwrap_or_default(),
                    node_id: node.id.clone(),
                    status: "completed".to_string(),
                    inputs: inputs_value,
                    outputs: Some(result.clone()),
                    error: None,
                    processing_time_ms: elapsed_ms,
                });
                StepEvent::Running {
                    node_id: node.id,
                    result,
                    variables: self.context.variables_snapshot(),
                }
            }
            Err(err) => {
                let error = err.to_string();
                self.context.log(
                    LogLevel::Error,
                    format!("node '{}' failed: {}", node.label(), error),
                    Some(node.id.as_str()),
                    None,
                );
                self.state = RunState::Failed;
                self.failure = Some((node.id.clone(), error.clone()));
                self.push_node_log(NodeLogRecord {
                    run_id: self.run_id.clone().unwrap_or_default(),
                    node_id: node.id.clone(),
                    status: "failed".to_string(),
                    inputs: inputs_value,
                    outputs: None,
                    error: Some(error.clone()),
                    processing_time_ms: elapsed_ms,
                });
                self.push_run_update(json!({
                    "status": "failed",
                    "failed_node": node.id.clone(),
                    "error": error.clone(),
                }));
                StepEvent::Failed {
                    node_id: node.id,
                    error,
                }
            }
        }
    }

    /// Create the run row on first use. Awaited once so node logs carry a
    /// run id; a store failure downgrades persistence, not the run.
    async fn ensure_run(&mut self) {
        if self.run_create_attempted || self.store.is_none() {
            return;
        }
        self.run_create_attempted = true;
        if let Some(store) = &self.store {
            match store.create_run(&self.workflow_id, &self.initial_inputs).await {
                Ok(run_id) => self.run_id = Some(run_id),
                Err(err) => self.context.log(
                    LogLevel::Warn,
                    format!("run history unavailable: {}", err),
                    None,
                    None,
                ),
            }
        }
    }

    /// Fire-and-forget terminal-state patch.
    fn push_run_update(&self, patch: Value) {
        let (Some(store), Some(run_id)) = (self.store.clone(), self.run_id.clone()) else {
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = store.update_run(&run_id, patch).await {
                tracing::warn!("failed to persist run update: {}", err);
            }
        });
    }

    /// Fire-and-forget node history record.
    fn push_node_log(&self, record: NodeLogRecord) {
        let Some(store) = self.store.clone() else {
            return;
        };
        if self.run_id.is_none() {
            return;
        }
        tokio::spawn(async move {
            if let Err(err) = store.add_node_log(record).await {
                tracing::warn!("failed to persist node log: {}", err);
            }
        });
    }
}
