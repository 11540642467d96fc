use thiserror::Error;

use crate::llm::LlmError;

/// Node-level errors, raised by individual node executors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Variable not found: {0}")]
    VariableNotFound(String),
    #[error("Missing required input: {0}")]
    MissingInput(String),
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for NodeError {
    fn from(e: serde_json::Error) -> Self {
        NodeError::SerializationError(e.to_string())
    }
}
