//! Build a petgraph dependency graph from a workflow document.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::dsl::{Connection, WorkflowNode};
use crate::error::WorkflowError;

/// Dependency graph over a document's nodes.
///
/// Node weights are document indices so the resolver can break readiness
/// ties by document order. Port information is irrelevant at this level; a
/// connection contributes one dependency edge regardless of which ports it
/// joins, and parallel edges between the same pair are kept as-is.
#[derive(Debug)]
pub struct WorkflowGraph {
    pub graph: DiGraph<usize, ()>,
    pub node_indices: HashMap<String, NodeIndex>,
}

/// Construct the graph, rejecting connections whose endpoints reference
/// nodes absent from the document.
pub fn build_graph(
    nodes: &[WorkflowNode],
    connections: &[Connection],
) -> Result<WorkflowGraph, WorkflowError> {
    let mut graph = DiGraph::new();
    let mut node_indices = HashMap::new();

    for (position, node) in nodes.iter().enumerate() {
        let index = graph.add_node(position);
        node_indices.insert(node.id.clone(), index);
    }

    for connection in connections {
        let from = *node_indices
            .get(&connection.from.node_id)
            .ok_or_else(|| WorkflowError::UnknownEndpoint(connection.from.node_id.clone()))?;
        let to = *node_indices
            .get(&connection.to.node_id)
            .ok_or_else(|| WorkflowError::UnknownEndpoint(connection.to.node_id.clone()))?;
        graph.add_edge(from, to, ());
    }

    Ok(WorkflowGraph {
        graph,
        node_indices,
    })
}
