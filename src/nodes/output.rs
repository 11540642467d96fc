use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::dsl::WorkflowNode;
use crate::error::NodeError;

use super::NodeExecutor;

/// Terminal node. Passes its input through as the node's recorded output,
/// formatted per `data.format`: `"text"` (default) passes the value
/// unchanged, `"json"` renders it as a pretty-printed JSON string.
pub struct OutputNodeExecutor;

#[async_trait]
impl NodeExecutor for OutputNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        _context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let input = inputs.get("input").cloned().unwrap_or(Value::Null);
        let format = node
            .data
            .get("format")
            .and_then(|v| v.as_str())
            .unwrap_or("text");

        match format {
            "json" => Ok(Value::String(serde_json::to_string_pretty(&input)?)),
            _ => Ok(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(data: Value) -> WorkflowNode {
        WorkflowNode {
            id: "o1".to_string(),
            node_type: "output".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_text_passthrough() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), json!({"k": 1}));
        let out = OutputNodeExecutor
            .execute(&node(json!({"format": "text"})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!({"k": 1}));
    }

    #[tokio::test]
    async fn test_json_formatting() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), json!({"k": 1}));
        let out = OutputNodeExecutor
            .execute(&node(json!({"format": "json"})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("{\n  \"k\": 1\n}"));
    }

    #[tokio::test]
    async fn test_absent_input_is_null() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let out = OutputNodeExecutor
            .execute(&node(json!({})), &HashMap::new(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, Value::Null);
    }
}
