//! Workflow document schema.
//!
//! Serde types mirroring the JSON documents the editor persists. The engine
//! only depends on `nodes` and `connections`; everything else on the document
//! (canvas positions, zoom level, ...) rides along inside `data` or is
//! ignored entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A configured unit of work in a workflow.
///
/// `data` carries node-specific configuration (prompt text, condition
/// settings, iteration caps). The engine treats it read-mostly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique node id within the document.
    pub id: String,
    /// Node type, the key into the [`crate::NodeRegistry`].
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node-specific configuration as flexible JSON.
    #[serde(default)]
    pub data: Value,
}

impl WorkflowNode {
    /// Display label: `data.label` when the editor set one, id otherwise.
    pub fn label(&self) -> &str {
        self.data
            .get("label")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.id)
    }
}

/// One side of a connection: a node and a port slot on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub node_id: String,
    #[serde(default)]
    pub port_index: usize,
    /// Optional explicit port label, used by the input router as a fallback
    /// when the node definition declares no name at `port_index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Endpoint {
    pub fn new(node_id: impl Into<String>, port_index: usize) -> Self {
        Endpoint {
            node_id: node_id.into(),
            port_index,
            port: None,
        }
    }
}

/// A directed edge from one node's output port to another's input port.
///
/// One source port may fan out to any number of targets; one target port
/// normally holds a single mapped input per run (multiple writers warn and
/// the later connection wins).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Connection {
    pub from: Endpoint,
    pub to: Endpoint,
}

impl Connection {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Connection { from, to }
    }
}

/// A whole workflow document as the document store hands it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}
