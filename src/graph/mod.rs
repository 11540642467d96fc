//! Dependency graph construction and execution-order resolution.

mod builder;
mod resolver;

pub use builder::{build_graph, WorkflowGraph};
pub use resolver::resolve_order;
