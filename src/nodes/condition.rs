use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::WorkflowNode;
use crate::error::NodeError;
use crate::evaluator::{compare, value_text, CompareOp};
use crate::llm::{parse_bool_response, LlmCallOptions, LlmClient};

use super::{BranchOutput, NodeExecutor};

/// Evaluate a node's condition, shared by the `if` and `loop` nodes.
///
/// `condition_type` selects the mode: `"variable"` compares a run variable
/// against a configured value; `"llm"` asks the model for a true/false
/// judgment about the routed input.
pub(crate) async fn evaluate_condition(
    node: &WorkflowNode,
    input: Option<&Value>,
    context: &mut ExecutionContext,
    llm: &Arc<dyn LlmClient>,
) -> Result<bool, NodeError> {
    let condition_type = node
        .data
        .get("condition_type")
        .and_then(|v| v.as_str())
        .unwrap_or("variable");

    match condition_type {
        "variable" => {
            let name = node
                .data
                .get("variable")
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    NodeError::ConfigError("condition has no variable configured".to_string())
                })?;
            let left = context
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| NodeError::VariableNotFound(name.to_string()))?;
            let op: CompareOp = node
                .data
                .get("operator")
                .and_then(|v| v.as_str())
                .unwrap_or("==")
                .parse()?;
            let right = node.data.get("value").cloned().unwrap_or(Value::Null);
            Ok(compare(op, &left, &right))
        }
        "llm" => {
            let condition = node
                .data
                .get("condition")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let subject = input.map(value_text).unwrap_or_default();
            let prompt = format!(
                "Decide whether the condition holds for the given input.\n\
                 Condition: {}\nInput: {}\n\
                 Reply with exactly \"true\" or \"false\" and nothing else.",
                condition, subject
            );
            let options = LlmCallOptions::from_node_data(&node.data);
            let response = llm.send_message(&prompt, None, &options).await?;
            let (value, ambiguous) = parse_bool_response(&response);
            if ambiguous {
                context.log(
                    LogLevel::Warn,
                    format!("ambiguous condition response: '{}'", response.trim()),
                    Some(node.id.as_str()),
                    None,
                );
            }
            Ok(value)
        }
        other => Err(NodeError::ConfigError(format!(
            "unknown condition_type: '{}'",
            other
        ))),
    }
}

/// Branch node. Evaluates its condition and routes the input value to the
/// `true` or `false` output port via a [`BranchOutput`].
pub struct IfNodeExecutor {
    llm: Arc<dyn LlmClient>,
}

impl IfNodeExecutor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        IfNodeExecutor { llm }
    }
}

#[async_trait]
impl NodeExecutor for IfNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let input = inputs.get("input");
        let condition = evaluate_condition(node, input, context, &self.llm).await?;
        context.log(
            LogLevel::Debug,
            format!("condition evaluated to {}", condition),
            Some(node.id.as_str()),
            None,
        );
        BranchOutput::new(condition, input.cloned().unwrap_or(Value::Null)).to_value()
    }
}
