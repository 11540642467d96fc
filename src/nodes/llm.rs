use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::WorkflowNode;
use crate::error::NodeError;
use crate::evaluator::value_text;
use crate::llm::{LlmCallOptions, LlmClient};

use super::NodeExecutor;

/// Model-call node. Builds the prompt from `data.prompt` with `{input}`
/// substituted from the routed input, then hands it to the [`LlmClient`].
pub struct LlmNodeExecutor {
    client: Arc<dyn LlmClient>,
}

impl LlmNodeExecutor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        LlmNodeExecutor { client }
    }

    /// Resolve the prompt for a node given its routed input.
    fn build_prompt(
        node: &WorkflowNode,
        input: Option<&Value>,
    ) -> Result<String, NodeError> {
        let template = node
            .data
            .get("prompt")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty());

        match (template, input) {
            (Some(template), Some(input)) => {
                Ok(template.replace("{input}", &value_text(input)))
            }
            (Some(template), None) => Ok(template.to_string()),
            (None, Some(input)) => Ok(value_text(input)),
            (None, None) => Err(NodeError::ConfigError(
                "llm node has neither a prompt nor an input".to_string(),
            )),
        }
    }
}

#[async_trait]
impl NodeExecutor for LlmNodeExecutor {
    async fn execute(
        &self,
        node: &WorkflowNode,
        inputs: &HashMap<String, Value>,
        context: &mut ExecutionContext,
    ) -> Result<Value, NodeError> {
        let prompt = Self::build_prompt(node, inputs.get("input"))?;
        let system_prompt = node
            .data
            .get("system_prompt")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty());
        let options = LlmCallOptions::from_node_data(&node.data);

        context.log(
            LogLevel::Debug,
            format!("calling model '{}'", options.model),
            Some(node.id.as_str()),
            None,
        );

        let response = self
            .client
            .send_message(&prompt, system_prompt, &options)
            .await?;
        Ok(Value::String(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl LlmClient for Upper {
        async fn send_message(
            &self,
            prompt: &str,
            _system_prompt: Option<&str>,
            _options: &LlmCallOptions,
        ) -> Result<String, LlmError> {
            Ok(prompt.to_uppercase())
        }
    }

    fn node(data: Value) -> WorkflowNode {
        WorkflowNode {
            id: "l1".to_string(),
            node_type: "llm".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_prompt_substitution() {
        let executor = LlmNodeExecutor::new(Arc::new(Upper));
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), json!("rust"));
        let out = executor
            .execute(
                &node(json!({"prompt": "Summarize: {input}"})),
                &inputs,
                &mut ctx,
            )
            .await
            .unwrap();
        assert_eq!(out, json!("SUMMARIZE: RUST"));
    }

    #[tokio::test]
    async fn test_input_alone_is_the_prompt() {
        let executor = LlmNodeExecutor::new(Arc::new(Upper));
        let mut ctx = ExecutionContext::new(HashMap::new());
        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), json!("plain"));
        let out = executor
            .execute(&node(json!({})), &inputs, &mut ctx)
            .await
            .unwrap();
        assert_eq!(out, json!("PLAIN"));
    }

    #[tokio::test]
    async fn test_no_prompt_no_input_is_config_error() {
        let executor = LlmNodeExecutor::new(Arc::new(Upper));
        let mut ctx = ExecutionContext::new(HashMap::new());
        let err = executor
            .execute(&node(json!({})), &HashMap::new(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::ConfigError(_)));
    }

    #[test]
    fn test_non_string_input_rendered_compactly() {
        let prompt =
            LlmNodeExecutor::build_prompt(&node(json!({"prompt": "Data: {input}"})), Some(&json!({"a": 1})))
                .unwrap();
        assert_eq!(prompt, "Data: {\"a\":1}");
    }
}
