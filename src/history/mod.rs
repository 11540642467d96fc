//! Run history persistence.
//!
//! The executor records run and per-node history through the [`RunStore`]
//! trait, fire-and-forget: a slow or failing store never blocks or fails a
//! run. [`MemoryRunStore`] is the in-process implementation used by tests
//! and single-process embedders.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Errors from a run store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Run store unavailable: {0}")]
    Unavailable(String),
    #[error("Run not found: {0}")]
    RunNotFound(String),
}

/// One node execution as persisted to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeLogRecord {
    pub run_id: String,
    pub node_id: String,
    /// "completed" or "failed".
    pub status: String,
    pub inputs: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub processing_time_ms: u64,
}

/// A persisted run row, as [`MemoryRunStore`] keeps it.
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub run_id: String,
    pub workflow_id: String,
    pub inputs: Value,
    pub created_at: DateTime<Utc>,
    /// Terminal patch applied by `update_run`, `None` while in flight.
    pub outcome: Option<Value>,
}

/// Persistence seam for run history.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Create a run row and return its id.
    async fn create_run(&self, workflow_id: &str, inputs: &Value) -> Result<String, StoreError>;

    /// Patch a run row with its terminal state.
    async fn update_run(&self, run_id: &str, patch: Value) -> Result<(), StoreError>;

    /// Append one node execution record.
    async fn add_node_log(&self, record: NodeLogRecord) -> Result<(), StoreError>;
}

/// In-memory [`RunStore`] backed by a mutex-held map.
#[derive(Default)]
pub struct MemoryRunStore {
    runs: Mutex<HashMap<String, RunRecord>>,
    node_logs: Mutex<Vec<NodeLogRecord>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&self, run_id: &str) -> Option<RunRecord> {
        self.runs.lock().ok()?.get(run_id).cloned()
    }

    pub fn node_logs(&self, run_id: &str) -> Vec<NodeLogRecord> {
        match self.node_logs.lock() {
            Ok(logs) => logs.iter().filter(|l| l.run_id == run_id).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create_run(&self, workflow_id: &str, inputs: &Value) -> Result<String, StoreError> {
        let run_id = Uuid::new_v4().to_string();
        let record = RunRecord {
            run_id: run_id.clone(),
            workflow_id: workflow_id.to_string(),
            inputs: inputs.clone(),
            created_at: Utc::now(),
            outcome: None,
        };
        self.runs
            .lock()
            .map_err(|_| StoreError::Unavailable("runs lock poisoned".to_string()))?
            .insert(run_id.clone(), record);
        Ok(run_id)
    }

    async fn update_run(&self, run_id: &str, patch: Value) -> Result<(), StoreError> {
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| StoreError::Unavailable("runs lock poisoned".to_string()))?;
        let record = runs
            .get_mut(run_id)
            .ok_or_else(|| StoreError::RunNotFound(run_id.to_string()))?;
        record.outcome = Some(patch);
        Ok(())
    }

    async fn add_node_log(&self, record: NodeLogRecord) -> Result<(), StoreError> {
        self.node_logs
            .lock()
            .map_err(|_| StoreError::Unavailable("node log lock poisoned".to_string()))?
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_update_run() {
        let store = MemoryRunStore::new();
        let run_id = store.create_run("wf1", &json!({"x": 1})).await.unwrap();
        assert!(store.run(&run_id).unwrap().outcome.is_none());

        store
            .update_run(&run_id, json!({"status": "completed"}))
            .await
            .unwrap();
        let record = store.run(&run_id).unwrap();
        assert_eq!(record.outcome.unwrap()["status"], "completed");
    }

    #[tokio::test]
    async fn test_update_unknown_run() {
        let store = MemoryRunStore::new();
        let result = store.update_run("nope", json!({})).await;
        assert!(matches!(result, Err(StoreError::RunNotFound(_))));
    }

    #[tokio::test]
    async fn test_node_logs_filtered_by_run() {
        let store = MemoryRunStore::new();
        for run_id in ["r1", "r1", "r2"] {
            store
                .add_node_log(NodeLogRecord {
                    run_id: run_id.to_string(),
                    node_id: "n1".to_string(),
                    status: "completed".to_string(),
                    inputs: json!({}),
                    outputs: Some(json!("out")),
                    error: None,
                    processing_time_ms: 3,
                })
                .await
                .unwrap();
        }
        assert_eq!(store.node_logs("r1").len(), 2);
        assert_eq!(store.node_logs("r2").len(), 1);
    }
}
