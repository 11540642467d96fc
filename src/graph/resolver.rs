//! Topological execution-order resolution.

use petgraph::Direction;

use crate::dsl::WorkflowNode;
use crate::error::WorkflowError;

use super::WorkflowGraph;

/// Resolve the execution order for a workflow graph.
///
/// Kahn's algorithm with a deterministic tie-break: among all ready nodes
/// (in-degree zero, counting every parallel edge) the one earliest in the
/// document is scheduled next, so the same document always yields the same
/// order. If any nodes remain unscheduled the graph contains a cycle and
/// the error lists them by label.
pub fn resolve_order(
    wg: &WorkflowGraph,
    nodes: &[WorkflowNode],
) -> Result<Vec<usize>, WorkflowError> {
    let count = wg.graph.node_count();
    let mut in_degree = vec![0usize; count];
    for edge in wg.graph.raw_edges() {
        in_degree[edge.target().index()] += 1;
    }

    let mut done = vec![false; count];
    let mut order = Vec::with_capacity(count);

    // Node index i holds document position i by construction, so scanning
    // indices ascending is scanning document order.
    loop {
        let Some(next) = (0..count).find(|&i| !done[i] && in_degree[i] == 0) else {
            break;
        };
        done[next] = true;
        order.push(next);
        let index = petgraph::graph::NodeIndex::new(next);
        for neighbor in wg.graph.neighbors_directed(index, Direction::Outgoing) {
            in_degree[neighbor.index()] -= 1;
        }
    }

    if order.len() < count {
        let unreachable = (0..count)
            .filter(|&i| !done[i])
            .map(|i| nodes[i].label().to_string())
            .collect();
        return Err(WorkflowError::CycleDetected { unreachable });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Connection, Endpoint};
    use crate::graph::build_graph;
    use serde_json::{json, Value};

    fn node(id: &str) -> WorkflowNode {
        WorkflowNode {
            id: id.to_string(),
            node_type: "input".to_string(),
            data: json!({}),
        }
    }

    fn connect(from: &str, to: &str) -> Connection {
        Connection::new(Endpoint::new(from, 0), Endpoint::new(to, 0))
    }

    fn order_of(nodes: &[WorkflowNode], connections: &[Connection]) -> Vec<String> {
        let wg = build_graph(nodes, connections).unwrap();
        resolve_order(&wg, nodes)
            .unwrap()
            .into_iter()
            .map(|i| nodes[i].id.clone())
            .collect()
    }

    #[test]
    fn test_linear_chain() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let connections = vec![connect("a", "b"), connect("b", "c")];
        assert_eq!(order_of(&nodes, &connections), ["a", "b", "c"]);
    }

    #[test]
    fn test_tie_break_follows_document_order() {
        // b and c are both ready after a; b comes first in the document.
        let nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let connections = vec![
            connect("a", "b"),
            connect("a", "c"),
            connect("b", "d"),
            connect("c", "d"),
        ];
        assert_eq!(order_of(&nodes, &connections), ["a", "b", "c", "d"]);

        // Swap b and c in the document and the order follows.
        let nodes = vec![node("a"), node("c"), node("b"), node("d")];
        assert_eq!(order_of(&nodes, &connections), ["a", "c", "b", "d"]);
    }

    #[test]
    fn test_isolated_nodes_run_in_document_order() {
        let nodes = vec![node("z"), node("m"), node("a")];
        assert_eq!(order_of(&nodes, &[]), ["z", "m", "a"]);
    }

    #[test]
    fn test_parallel_edges_both_counted() {
        // Two edges a->b; b must still end up with in-degree zero.
        let nodes = vec![node("a"), node("b")];
        let connections = vec![connect("a", "b"), connect("a", "b")];
        assert_eq!(order_of(&nodes, &connections), ["a", "b"]);
    }

    #[test]
    fn test_cycle_names_members() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let connections = vec![connect("a", "b"), connect("b", "c"), connect("c", "b")];
        let wg = build_graph(&nodes, &connections).unwrap();
        let err = resolve_order(&wg, &nodes).unwrap_err();
        match err {
            WorkflowError::CycleDetected { unreachable } => {
                assert_eq!(unreachable, ["b", "c"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_cycle_uses_labels_when_present() {
        let mut a = node("a");
        a.data = Value::Object(
            [("label".to_string(), json!("First"))]
                .into_iter()
                .collect(),
        );
        let nodes = vec![a, node("b")];
        let connections = vec![connect("a", "b"), connect("b", "a")];
        let wg = build_graph(&nodes, &connections).unwrap();
        let err = resolve_order(&wg, &nodes).unwrap_err();
        assert!(err.to_string().contains("First"));
        assert!(err.to_string().contains("b"));
    }
}
