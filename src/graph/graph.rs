//! In-memory node/edge collection backing the canvas.
//!
//! The model wraps a `StableDiGraph` so node indices stay valid across
//! removals, plus an id index for name lookups. Reads are public; every
//! mutation is crate-private so only the editor can change the canvas.

use std::collections::HashMap;

use petgraph::{
    Direction,
    stable_graph::{NodeIndex, StableDiGraph},
    visit::EdgeRef,
};
use tracing::warn;

use crate::{
    ShareLock,
    graph::{GraphEdge, GraphNode, NodeId},
    model::{Handle, Position},
};

#[derive(Default)]
struct Canvas {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Canvas {
    fn insert_edge(
        &mut self,
        edge: GraphEdge,
    ) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(&edge.source), self.index.get(&edge.target)) else {
            return false;
        };
        let stale: Vec<_> = self.graph.edges_directed(from, Direction::Outgoing).filter(|e| e.weight().source_handle == edge.source_handle).map(|e| e.id()).collect();
        for idx in stale {
            self.graph.remove_edge(idx);
        }
        self.graph.add_edge(from, to, edge);
        true
    }
}

/// Thread-safe canvas graph.
#[derive(Clone, Default)]
pub struct GraphModel {
    canvas: ShareLock<Canvas>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output a human-readable representation of the canvas graph
    pub fn schema(&self) -> String {
        let canvas = self.canvas.read().unwrap();
        let graph = &canvas.graph;
        let mut lines = Vec::new();

        lines.push("=== State Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", graph.node_count(), graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for node in self.sorted_nodes(graph) {
            lines.push(format!("[{}] at ({}, {})", node.id, node.position.x, node.position.y));
        }
        lines.push(String::new());

        lines.push("--- Edges ---".to_string());
        for edge in self.sorted_edges(graph) {
            lines.push(format!("{} --[{}]--> {} (id: {})", edge.source, edge.source_handle, edge.target, edge.id));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for node in self.sorted_nodes(graph) {
            let Some(&idx) = canvas.index.get(&node.id) else {
                continue;
            };
            let mut outgoing: Vec<String> = graph.edges_directed(idx, Direction::Outgoing).map(|e| format!("{}({})", graph[e.target()].id, e.weight().source_handle)).collect();
            outgoing.sort();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }

    /// all nodes, ordered by id
    pub fn nodes(&self) -> Vec<GraphNode> {
        let canvas = self.canvas.read().unwrap();
        self.sorted_nodes(&canvas.graph)
    }

    /// all edges, ordered by source then handle
    pub fn edges(&self) -> Vec<GraphEdge> {
        let canvas = self.canvas.read().unwrap();
        self.sorted_edges(&canvas.graph)
    }

    /// get node by id
    pub fn node(
        &self,
        id: &str,
    ) -> Option<GraphNode> {
        let canvas = self.canvas.read().unwrap();
        canvas.index.get(id).map(|idx| canvas.graph[*idx].clone())
    }

    /// get edge by id
    pub fn edge(
        &self,
        id: &str,
    ) -> Option<GraphEdge> {
        let canvas = self.canvas.read().unwrap();
        canvas.graph.edge_indices().find(|idx| canvas.graph[*idx].id == id).map(|idx| canvas.graph[idx].clone())
    }

    pub fn contains(
        &self,
        id: &str,
    ) -> bool {
        self.canvas.read().unwrap().index.contains_key(id)
    }

    /// Get all outgoing edges from a node
    pub fn outgoing(
        &self,
        id: &str,
    ) -> Vec<GraphEdge> {
        let canvas = self.canvas.read().unwrap();
        let Some(&idx) = canvas.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<GraphEdge> = canvas.graph.edges_directed(idx, Direction::Outgoing).map(|e| e.weight().clone()).collect();
        edges.sort_by_key(|e| e.source_handle);
        edges
    }

    /// Get all incoming edges of a node
    pub fn incoming(
        &self,
        id: &str,
    ) -> Vec<GraphEdge> {
        let canvas = self.canvas.read().unwrap();
        let Some(&idx) = canvas.index.get(id) else {
            return Vec::new();
        };
        canvas.graph.edges_directed(idx, Direction::Incoming).map(|e| e.weight().clone()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.canvas.read().unwrap().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.canvas.read().unwrap().graph.edge_count()
    }

    /// Replaces the whole canvas. Edges with an unknown endpoint are dropped.
    pub(crate) fn replace(
        &self,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) {
        let mut canvas = Canvas::default();
        for node in nodes {
            let id = node.id.clone();
            let idx = canvas.graph.add_node(node);
            canvas.index.insert(id, idx);
        }
        for edge in edges {
            let id = edge.id.clone();
            if !canvas.insert_edge(edge) {
                warn!("graph::replace dropped dangling edge {}", id);
            }
        }
        *self.canvas.write().unwrap() = canvas;
    }

    /// add node, replacing any node with the same id
    pub(crate) fn insert_node(
        &self,
        node: GraphNode,
    ) {
        let mut canvas = self.canvas.write().unwrap();
        if let Some(&idx) = canvas.index.get(&node.id) {
            canvas.graph[idx] = node;
            return;
        }
        let id = node.id.clone();
        let idx = canvas.graph.add_node(node);
        canvas.index.insert(id, idx);
    }

    /// remove node together with its incident edges
    pub(crate) fn remove_node(
        &self,
        id: &str,
    ) -> Option<GraphNode> {
        let mut canvas = self.canvas.write().unwrap();
        let idx = canvas.index.remove(id)?;
        canvas.graph.remove_node(idx)
    }

    pub(crate) fn set_position(
        &self,
        id: &str,
        position: Position,
    ) -> bool {
        let mut canvas = self.canvas.write().unwrap();
        let Some(&idx) = canvas.index.get(id) else {
            return false;
        };
        canvas.graph[idx].position = position;
        true
    }

    /// Adds `edge`, replacing the edge on the same (source, handle).
    /// Returns false when either endpoint is missing.
    pub(crate) fn set_edge(
        &self,
        edge: GraphEdge,
    ) -> bool {
        self.canvas.write().unwrap().insert_edge(edge)
    }

    /// Drops the edge leaving `source` on `handle`, if any.
    pub(crate) fn clear_edge(
        &self,
        source: &str,
        handle: Handle,
    ) {
        let mut canvas = self.canvas.write().unwrap();
        let Some(&idx) = canvas.index.get(source) else {
            return;
        };
        let stale: Vec<_> = canvas.graph.edges_directed(idx, Direction::Outgoing).filter(|e| e.weight().source_handle == handle).map(|e| e.id()).collect();
        for edge in stale {
            canvas.graph.remove_edge(edge);
        }
    }

    fn sorted_nodes(
        &self,
        graph: &StableDiGraph<GraphNode, GraphEdge>,
    ) -> Vec<GraphNode> {
        let mut nodes: Vec<GraphNode> = graph.node_weights().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    fn sorted_edges(
        &self,
        graph: &StableDiGraph<GraphNode, GraphEdge>,
    ) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = graph.edge_weights().cloned().collect();
        edges.sort_by(|a, b| (&a.source, a.source_handle).cmp(&(&b.source, b.source_handle)));
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphModel {
        let graph = GraphModel::new();
        graph.replace(
            vec![
                GraphNode::new("A", Position::new(0.0, 0.0)),
                GraphNode::new("B", Position::new(100.0, 0.0)),
                GraphNode::new("C", Position::new(200.0, 0.0)),
            ],
            vec![GraphEdge::new("A", "B", Handle::Success), GraphEdge::new("B", "C", Handle::Failure)],
        );
        graph
    }

    #[test]
    fn test_replace_drops_dangling_edges() {
        let graph = GraphModel::new();
        graph.replace(vec![GraphNode::new("A", Position::default())], vec![GraphEdge::new("A", "Z", Handle::Success)]);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_set_edge_replaces_same_handle() {
        let graph = sample();
        assert!(graph.set_edge(GraphEdge::new("A", "C", Handle::Success)));

        let outgoing = graph.outgoing("A");
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].target, "C");
        assert!(graph.edge("A-B").is_none());
    }

    #[test]
    fn test_set_edge_requires_endpoints() {
        let graph = sample();
        assert!(!graph.set_edge(GraphEdge::new("A", "Z", Handle::Failure)));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_remove_node_removes_incident_edges() {
        let graph = sample();
        assert!(graph.remove_node("B").is_some());
        assert!(!graph.contains("B"));
        assert_eq!(graph.edge_count(), 0);
        // indices of the remaining nodes survive the removal
        assert_eq!(graph.node("C").unwrap().position.x, 200.0);
        assert!(graph.remove_node("B").is_none());
    }

    #[test]
    fn test_set_position_and_clear_edge() {
        let graph = sample();
        assert!(graph.set_position("A", Position::new(5.0, 6.0)));
        assert!(!graph.set_position("Z", Position::default()));
        assert_eq!(graph.node("A").unwrap().position, Position::new(5.0, 6.0));

        graph.clear_edge("B", Handle::Failure);
        assert!(graph.outgoing("B").is_empty());
        assert_eq!(graph.incoming("B").len(), 1);
    }

    #[test]
    fn test_schema() {
        let schema = sample().schema();
        assert!(schema.contains("Nodes: 3, Edges: 2"));
        assert!(schema.contains("A --[success]--> B (id: A-B)"));
        assert!(schema.contains("C -> (end)"));
    }
}
