//! Canvas-facing graph model.
//!
//! Nodes carry only an id, a label and a position; edges carry their
//! handle-derived styling. Nothing here talks to the definition store.

mod edge;
mod graph;
mod node;

pub use edge::{EdgeStyle, GraphEdge};
pub use graph::GraphModel;
pub use node::{GraphNode, NodeId};
