//! Per-run execution context.
//!
//! One [`ExecutionContext`] lives for exactly one run and carries the three
//! pieces of mutable run state: the shared variable map, per-node outputs,
//! and the bounded run log. Nothing in it is shared between runs.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Oldest entries are dropped once the run log passes this many entries.
pub const LOG_CAPACITY: usize = 500;

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One entry in the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Mutable state for a single workflow run.
pub struct ExecutionContext {
    /// Named variables shared across the run. Written by `variable` and
    /// `loop` nodes, read by condition evaluation and the `input` node.
    pub variables: HashMap<String, Value>,
    node_outputs: HashMap<String, Value>,
    log: VecDeque<LogEntry>,
}

impl ExecutionContext {
    pub fn new(initial_variables: HashMap<String, Value>) -> Self {
        ExecutionContext {
            variables: initial_variables,
            node_outputs: HashMap::new(),
            log: VecDeque::new(),
        }
    }

    /// Append a log entry, dropping the oldest past [`LOG_CAPACITY`]. Each
    /// entry is mirrored to `tracing` at the matching level.
    pub fn log(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        node_id: Option<&str>,
        data: Option<Value>,
    ) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(node_id = ?node_id, "{}", message),
            LogLevel::Info => tracing::info!(node_id = ?node_id, "{}", message),
            LogLevel::Warn => tracing::warn!(node_id = ?node_id, "{}", message),
            LogLevel::Error => tracing::error!(node_id = ?node_id, "{}", message),
        }
        self.log.push_back(LogEntry {
            timestamp: Utc::now(),
            level,
            message,
            node_id: node_id.map(|s| s.to_string()),
            data,
        });
        while self.log.len() > LOG_CAPACITY {
            self.log.pop_front();
        }
    }

    /// Record a node's final output value for the run.
    pub fn record_output(&mut self, node_id: &str, value: Value) {
        self.node_outputs.insert(node_id.to_string(), value);
    }

    pub fn node_output(&self, node_id: &str) -> Option<&Value> {
        self.node_outputs.get(node_id)
    }

    pub fn node_outputs(&self) -> &HashMap<String, Value> {
        &self.node_outputs
    }

    pub fn log_entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    /// Snapshot of the variable map as a JSON object, in the shape run
    /// events and loop iteration records carry.
    pub fn variables_snapshot(&self) -> Value {
        Value::Object(
            self.variables
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_and_read_output() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        ctx.record_output("n1", json!("out"));
        assert_eq!(ctx.node_output("n1"), Some(&json!("out")));
        assert!(ctx.node_output("n2").is_none());
    }

    #[test]
    fn test_log_ring_drops_oldest() {
        let mut ctx = ExecutionContext::new(HashMap::new());
        for i in 0..(LOG_CAPACITY + 10) {
            ctx.log(LogLevel::Info, format!("entry {}", i), None, None);
        }
        assert_eq!(ctx.log_entries().count(), LOG_CAPACITY);
        let first = ctx.log_entries().next().unwrap();
        assert_eq!(first.message, "entry 10");
    }

    #[test]
    fn test_variables_snapshot() {
        let mut vars = HashMap::new();
        vars.insert("counter".to_string(), json!(2));
        let ctx = ExecutionContext::new(vars);
        assert_eq!(ctx.variables_snapshot(), json!({"counter": 2}));
    }

    #[test]
    fn test_log_level_serde() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"warn\"");
    }
}
