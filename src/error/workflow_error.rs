//! Workflow-level error types.

use super::NodeError;
use thiserror::Error;

/// Workflow-level errors. Graph-validity variants are raised at
/// [`crate::WorkflowExecutor::start`], before any node executes.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Connection references unknown node: {0}")]
    UnknownEndpoint(String),
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("Cycle detected; unreachable nodes: {}", unreachable.join(", "))]
    CycleDetected { unreachable: Vec<String> },
    #[error("Node executor not found for type: {0}")]
    ExecutorNotFound(String),
    #[error("Invalid node definition for type '{node_type}': {reason}")]
    InvalidDefinition { node_type: String, reason: String },
    #[error("Node execution error: node={node_id}, error={error}")]
    NodeExecution { node_id: String, error: String },
    #[error("Node error: {0}")]
    NodeError(Box<NodeError>),
}

impl From<NodeError> for WorkflowError {
    fn from(value: NodeError) -> Self {
        WorkflowError::NodeError(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_display() {
        assert_eq!(
            WorkflowError::UnknownEndpoint("n9".into()).to_string(),
            "Connection references unknown node: n9"
        );
        assert_eq!(
            WorkflowError::DuplicateNodeId("n1".into()).to_string(),
            "Duplicate node id: n1"
        );
        assert_eq!(
            WorkflowError::ExecutorNotFound("magic".into()).to_string(),
            "Node executor not found for type: magic"
        );
        assert_eq!(
            WorkflowError::InvalidDefinition {
                node_type: "llm".into(),
                reason: "unknown color".into()
            }
            .to_string(),
            "Invalid node definition for type 'llm': unknown color"
        );
    }

    #[test]
    fn test_cycle_error_names_unreachable_nodes() {
        let err = WorkflowError::CycleDetected {
            unreachable: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Cycle detected; unreachable nodes: a, b");
    }

    #[test]
    fn test_workflow_error_from_node_error() {
        let node_err = NodeError::VariableNotFound("counter".into());
        let wf_err: WorkflowError = node_err.into();
        assert!(matches!(wf_err, WorkflowError::NodeError(_)));
        assert!(wf_err.to_string().contains("counter"));
    }
}
