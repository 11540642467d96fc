use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::dsl::WorkflowNode;
use crate::error::NodeError;

use super::NodeExecutor;

/// Entry point node: emits either a named run variable or a literal value
/// from its configuration.
pub struct InputNodeExecutor;

#[async_trait]
impl NodeExecutor for InputNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        _inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        if let Some(name) = node
            .data
            .get("variable")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
        {
            return context
                .variables
                .get(name)
                .cloned()
                .ok_or_else(|| NodeError::VariableNotFound(name.to_string()));
        }

        Ok(node.data.get("value").cloned().unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(data: Value) -> WorkflowNode {
        WorkflowNode {
            id: "i1".to_string(),
            node_type: "input".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_literal_value() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let out = InputNodeExecutor
            .execute(&node(json!({"value": "hello"})), &HashMap::new(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("hello"));
    }

    #[tokio::test]
    async fn test_variable_lookup() {
        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), json!("rust"));
        let mut ctx = ExecutionContext::new(vars);
        let out = InputNodeExecutor
            .execute(&node(json!({"variable": "topic"})), &HashMap::new(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("rust"));
    }

    #[tokio::test]
    async fn test_missing_variable_is_error() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let err = InputNodeExecutor
            .execute(&node(json!({"variable": "ghost"})), &HashMap::new(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::VariableNotFound(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_no_config_yields_null() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        let out = InputNodeExecutor
            .execute(&node(json!({})), &HashMap::new(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, Value::Null);
    }
}
