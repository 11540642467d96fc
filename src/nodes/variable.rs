use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::WorkflowNode;
use crate::error::NodeError;

use super::NodeExecutor;

/// Writes a named run variable and passes the value through.
///
/// The value comes from the `value` input port when connected, otherwise
/// from `data.value`.
pub struct VariableNodeExecutor;

#[async_trait]
impl NodeExecutor for VariableNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let name = node
            .data
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NodeError::ConfigError("variable node has no name configured".to_string())
            })?;

        let value = inputs
            .get("value")
            .cloned()
            .or_else(|| node.data.get("value").cloned())
            .unwrap_or(Value::Null);

        if context.variables.contains_key(name) {
            context.log(
                LogLevel::Debug,
                format!("overwriting variable '{}'", name),
                Some(node.id.as_str()),
                None,
            );
        }
        context.variables.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(data: Value) -> WorkflowNode {
        WorkflowNode {
            id: "v1".to_string(),
            node_type: "variable".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_sets_variable_from_input() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("value".to_string(), json!(42));
        let out = VariableNodeExecutor
            .execute(&node(json!({"name": "answer"})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!(42));
        assert_eq!(ctx.variables["answer"], json!(42));
    }

    #[tokio::test]
    async fn test_falls_back_to_configured_value() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let out = VariableNodeExecutor
            .execute(
                &node(json!({"name": "greeting", "value": "hi"})),
                &HashMap::new(),
                &mut ctx,
            )
            .await
            .unwrap();
        assert_eq!(out, json!("hi"));
        assert_eq!(ctx.variables["greeting"], json!("hi"));
    }

    #[tokio::test]
    async fn test_missing_name_is_config_error() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let err = VariableNodeExecutor
            .execute(&node(json!({})), &HashMap::new(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ConfigError(_)));
    }
}
