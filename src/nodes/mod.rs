//! Node executors and the node registry.
//!
//! Every node type is a [`NodeDefinition`]: metadata the editor renders
//! (label, color, port names) plus the [`NodeExecutor`] that runs it.
//! Embedders extend the engine by registering additional definitions; the
//! seven builtins come from [`default_registry`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::dsl::WorkflowNode;
use crate::error::{NodeError, WorkflowError};
use crate::llm::LlmClient;

mod combine;
mod condition;
mod input;
mod llm;
mod loop_node;
mod output;
mod variable;

pub use combine::CombineNodeExecutor;
pub use condition::IfNodeExecutor;
pub use input::InputNodeExecutor;
pub use llm::LlmNodeExecutor;
pub use loop_node::{LoopNodeExecutor, MAX_ITERATIONS};
pub use output::OutputNodeExecutor;
pub use variable::VariableNodeExecutor;

/// Colors a node definition may use, matching the editor palette.
pub const PALETTE: &[&str] = &[
    "slate", "blue", "green", "amber", "rose", "violet", "cyan", "emerald",
];

/// A unit of node behavior.
///
/// Executors are stateless and shared across runs; all per-run state lives
/// in the [`ExecutionContext`].
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError>;
}

/// A registered node type: editor metadata plus its executor.
#[derive(Clone)]
pub struct NodeDefinition {
    pub label: String,
    pub color: String,
    /// Input port names, positional. `port_index` on a connection's target
    /// endpoint indexes into this.
    pub inputs: Vec<String>,
    /// Output port names, positional.
    pub outputs: Vec<String>,
    /// Data the editor seeds new nodes of this type with.
    pub default_data: Value,
    pub executor: Arc<dyn NodeExecutor>,
}

/// Node type lookup table.
#[derive(Default)]
pub struct NodeRegistry {
    definitions: HashMap<String, NodeDefinition>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, validating the definition. Re-registering a
    /// type replaces the previous definition.
    pub fn register(
        &mut self,
        node_type: &str,
        definition: NodeDefinition,
    ) -> Result<(), WorkflowError> {
        if node_type.trim().is_empty() {
            return Err(WorkflowError::InvalidDefinition {
                node_type: node_type.to_string(),
                reason: "node type must be non-empty".to_string(),
            });
        }
        if !PALETTE.contains(&definition.color.as_str()) {
            return Err(WorkflowError::InvalidDefinition {
                node_type: node_type.to_string(),
                reason: format!("unknown color '{}'", definition.color),
            });
        }
        for port in definition.inputs.iter().chain(definition.outputs.iter()) {
            if port.trim().is_empty() {
                return Err(WorkflowError::InvalidDefinition {
                    node_type: node_type.to_string(),
                    reason: "port names must be non-empty".to_string(),
                });
            }
        }
        self.definitions.insert(node_type.to_string(), definition);
        Ok(())
    }

    pub fn get(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.definitions.get(node_type)
    }

    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(|s| s.as_str())
    }
}

/// The wire shape of an `if` node's output: the evaluated condition and the
/// passthrough value on the taken branch. The untaken branch serializes as
/// `null` and reads back as `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchOutput {
    pub condition: bool,
    #[serde(rename = "true", default)]
    pub true_branch: Option<Value>,
    #[serde(rename = "false", default)]
    pub false_branch: Option<Value>,
}

impl BranchOutput {
    pub fn new(condition: bool, value: Value) -> Self {
        if condition {
            BranchOutput {
                condition,
                true_branch: Some(value),
                false_branch: None,
            }
        } else {
            BranchOutput {
                condition,
                true_branch: None,
                false_branch: Some(value),
            }
        }
    }

    /// The branch value for an output port, `None` on the untaken side.
    pub fn branch(&self, port_index: usize) -> Option<&Value> {
        match port_index {
            0 => self.true_branch.as_ref(),
            _ => self.false_branch.as_ref(),
        }
    }

    pub fn to_value(&self) -> Result<Value, NodeError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

/// Build a registry holding the seven builtin node types.
pub fn default_registry(llm: Arc<dyn LlmClient>) -> Result<NodeRegistry, WorkflowError> {
    let mut registry = NodeRegistry::new();

    registry.register(
        "input",
        NodeDefinition {
            label: "Input".to_string(),
            color: "slate".to_string(),
            inputs: vec![],
            outputs: vec!["output".to_string()],
            default_data: serde_json::json!({"value": ""}),
            executor: Arc::new(InputNodeExecutor),
        },
    )?;

    registry.register(
        "llm",
        NodeDefinition {
            label: "LLM".to_string(),
            color: "violet".to_string(),
            inputs: vec!["input".to_string()],
            outputs: vec!["output".to_string()],
            default_data: serde_json::json!({"prompt": "", "model": "gpt-4o-mini"}),
            executor: Arc::new(LlmNodeExecutor::new(llm.clone())),
        },
    )?;

    registry.register(
        "if",
        NodeDefinition {
            label: "If".to_string(),
            color: "amber".to_string(),
            inputs: vec!["input".to_string()],
            outputs: vec!["true".to_string(), "false".to_string()],
            default_data: serde_json::json!({"condition_type": "variable", "operator": "=="}),
            executor: Arc::new(IfNodeExecutor::new(llm.clone())),
        },
    )?;

    registry.register(
        "loop",
        NodeDefinition {
            label: "Loop".to_string(),
            color: "cyan".to_string(),
            inputs: vec!["input".to_string()],
            outputs: vec!["output".to_string()],
            default_data: serde_json::json!({
                "condition_type": "variable",
                "operator": "<",
                "max_iterations": loop_node::MAX_ITERATIONS,
            }),
            executor: Arc::new(LoopNodeExecutor::new(llm)),
        },
    )?;

    registry.register(
        "variable",
        NodeDefinition {
            label: "Variable".to_string(),
            color: "green".to_string(),
            inputs: vec!["value".to_string()],
            outputs: vec!["output".to_string()],
            default_data: serde_json::json!({"name": ""}),
            executor: Arc::new(VariableNodeExecutor),
        },
    )?;

    registry.register(
        "combine",
        NodeDefinition {
            label: "Combine".to_string(),
            color: "blue".to_string(),
            inputs: vec!["input1".to_string(), "input2".to_string()],
            outputs: vec!["output".to_string()],
            default_data: serde_json::json!({"separator": "\n"}),
            executor: Arc::new(CombineNodeExecutor),
        },
    )?;

    registry.register(
        "output",
        NodeDefinition {
            label: "Output".to_string(),
            color: "rose".to_string(),
            inputs: vec!["input".to_string()],
            outputs: vec![],
            default_data: serde_json::json!({"format": "text"}),
            executor: Arc::new(OutputNodeExecutor),
        },
    )?;

    Ok(registry)
}
