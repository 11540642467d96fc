use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::dsl::WorkflowNode;
use crate::error::NodeError;
use crate::evaluator::value_text;

use super::NodeExecutor;

/// Joins its two inputs as text, separated by `data.separator` (newline by
/// default). Absent or null inputs are skipped rather than rendered.
pub struct CombineNodeExecutor;

#[async_trait]
impl NodeExecutor for CombineNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        _context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let separator = node
            .data
            .get("separator")
            .and_then(|v| v.as_str())
            .unwrap_or("\n");

        let parts: Vec<String> = ["input1", "input2"]
            .iter()
            .filter_map(|port| inputs.get(*port))
            .filter(|v| !v.is_null())
            .map(value_text)
            .collect();

        Ok(Value::String(parts.join(separator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(data: Value) -> WorkflowNode {
        WorkflowNode {
            id: "cmb1".to_string(),
            node_type: "combine".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_join_with_default_separator() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input1".to_string(), json!("first"));
        inputs.insert("input2".to_string(), json!("second"));
        let out = CombineNodeExecutor
            .execute(&node(json!({})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("first\nsecond"));
    }

    #[tokio::test]
    async fn test_custom_separator_and_non_strings() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input1".to_string(), json!(1));
        inputs.insert("input2".to_string(), json!("two"));
        let out = CombineNodeExecutor
            .execute(&node(json!({"separator": ", "})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("1, two"));
    }

    #[tokio::test]
    async fn test_absent_and_null_inputs_skipped() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input2".to_string(), json!(null));
        let out = CombineNodeExecutor
            .execute(&node(json!({})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!(""));
    }
}
