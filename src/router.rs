//! Input routing: maps upstream node outputs onto a node's named inputs.
//!
//! Routing walks the document's connections in order and is tolerant by
//! construction: a connection whose source has not produced an output (an
//! untaken branch, a skipped node) contributes nothing instead of failing
//! the run.

use std::collections::HashMap;

use serde_json::Value;

use crate::context::{ExecutionContext, LogLevel};
use crate::dsl::{Connection, WorkflowNode};
use crate::nodes::{BranchOutput, NodeRegistry};

/// Collect the named inputs for `target` from recorded upstream outputs.
///
/// Input names resolve, in order, from: the target definition's port name
/// at the connection's `port_index`, the connection's explicit `port`
/// label, and finally a positional `input{N}` fallback. Branch-node sources
/// are unwrapped to the connected port's branch value, with the untaken
/// side contributing nothing. When several connections write the same
/// input, the later one wins with a warning. An `llm` target whose sole
/// routed input arrived under another name is additionally aliased to
/// `input`, so prompt templating works regardless of upstream port naming.
pub fn collect_inputs(
    target: &WorkflowNode,
    nodes: &[WorkflowNode],
    connections: &[Connection],
    registry: &NodeRegistry,
    context: &mut ExecutionContext,
) -> HashMap<String, Value> {
    let definition = registry.get(&target.node_type);
    let mut inputs = HashMap::new();

    for connection in connections.iter().filter(|c| c.to.node_id == target.id) {
        let Some(output) = context.node_output(&connection.from.node_id).cloned() else {
            context.log(
                LogLevel::Debug,
                format!("no output recorded for '{}', skipping", connection.from.node_id),
                Some(target.id.as_str()),
                None,
            );
            continue;
        };

        let source_is_branch = nodes
            .iter()
            .find(|n| n.id == connection.from.node_id)
            .map(|n| n.node_type == "if")
            .unwrap_or(false);

        let value = if source_is_branch {
            match BranchOutput::from_value(&output)
                .and_then(|b| b.branch(connection.from.port_index).cloned())
            {
                Some(value) => value,
                // Untaken branch: this connection carries nothing.
                None => continue,
            }
        } else {
            output
        };

        let name = definition
            .and_then(|d| d.inputs.get(connection.to.port_index).cloned())
            .or_else(|| connection.to.port.clone())
            .unwrap_or_else(|| format!("input{}", connection.to.port_index));

        if inputs.contains_key(&name) {
            context.log(
                LogLevel::Warn,
                format!("multiple connections write input '{}', keeping the later one", name),
                Some(target.id.as_str()),
                None,
            );
        }
        inputs.insert(name, value);
    }

    if target.node_type == "llm" && !inputs.contains_key("input") && inputs.len() == 1 {
        if let Some(key) = inputs.keys().next().cloned() {
            if let Some(value) = inputs.get(&key).cloned() {
                inputs.insert("input".to_string(), value);
            }
        }
    }

    inputs
}
