use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::WorkflowNode;
use crate::error::NodeError;
use crate::llm::LlmClient;

use super::condition::evaluate_condition;
use super::NodeExecutor;

/// Hard ceiling on loop iterations. `data.max_iterations` may lower it but
/// never raise it; configured values above the ceiling are clamped with a
/// warning.
pub const MAX_ITERATIONS: u64 = 100;

/// Bounded iteration node.
///
/// Re-evaluates its condition before each pass and records one result entry
/// per iteration. In variable mode the loop variable is initialized to 0
/// when unset and incremented by 1 after every pass; whole-number counters
/// stay integers. Hitting the iteration cap ends the loop normally rather
/// than failing the run.
pub struct LoopNodeExecutor {
    llm: Arc<dyn LlmClient>,
}

impl LoopNodeExecutor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        LoopNodeExecutor { llm }
    }

    fn max_iterations(node: &WorkflowNode, context: &mut ExecutionContext) -> u64 {
        match node
            .data
            .get("max_iterations")
            .and_then(|v| v.as_u64())
            .filter(|&n| n > 0)
        {
            Some(configured) if configured > MAX_ITERATIONS => {
                context.log(
                    LogLevel::Warn,
                    format!(
                        "max_iterations {} exceeds the ceiling, clamping to {}",
                        configured, MAX_ITERATIONS
                    ),
                    Some(node.id.as_str()),
                    None,
                );
                MAX_ITERATIONS
            }
            Some(configured) => configured,
            None => MAX_ITERATIONS,
        }
    }

    fn increment(value: &Value) -> Value {
        // Keep whole-number counters as integers.
        if let Some(n) = value.as_i64() {
            return json!(n + 1);
        }
        if let Some(f) = value.as_f64() {
            return json!(f + 1.0);
        }
        json!(1)
    }
}

#[async_trait]
impl NodeExecutor for LoopNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let input = inputs.get("input").cloned();
        let max_iterations = Self::max_iterations(node, context);
        let condition_type = node
            .data
            .get("condition_type")
            .and_then(|v| v.as_str())
            .unwrap_or("variable");
        let loop_variable = node
            .data
            .get("variable")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        // Variable-mode loops count from 0 when the variable is unset.
        if condition_type == "variable" {
            if let Some(name) = &loop_variable {
                context
                    .variables
                    .entry(name.clone())
                    .or_insert_with(|| json!(0));
            }
        }

        let mut results = Vec::new();
        let mut iterations: u64 = 0;

        while iterations < max_iterations {
            if !evaluate_condition(node, input.as_ref(), context, &self.llm).await? {
                break;
            }

            iterations += 1;
            results.push(json!({
                "iteration": iterations,
                "input": input.clone().unwrap_or(Value::Null),
                "variables": context.variables_snapshot(),
            }));

            if condition_type == "variable" {
                if let Some(name) = &loop_variable {
                    let next = context.variables.get(name).map(Self::increment);
                    if let Some(next) = next {
                        context.variables.insert(name.clone(), next);
                    }
                }
            }
        }

        if iterations == max_iterations {
            context.log(
                LogLevel::Warn,
                format!("loop stopped at iteration cap ({})", max_iterations),
                Some(node.id.as_str()),
                None,
            );
        }

        Ok(json!({
            "iterations": iterations,
            "results": results,
            "output": input.unwrap_or(Value::Null),
        }))
    }
}
