//! Canvas edges.
//!
//! Color and label are a pure function of the source handle.

use serde::{Deserialize, Serialize};

use crate::{
    graph::NodeId,
    model::{Edge, EdgeId, Handle},
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EdgeStyle {
    pub stroke: String,
}

/// A transition as drawn on the canvas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub source_handle: Handle,
    pub label: String,
    pub style: EdgeStyle,
}

impl GraphEdge {
    pub fn new(
        source: &str,
        target: &str,
        handle: Handle,
    ) -> Self {
        Self::from(&Edge::new(source, target, handle))
    }

    /// Back to the persisted edge shape.
    pub fn to_edge(&self) -> Edge {
        Edge::new(&self.source, &self.target, self.source_handle)
    }
}

impl From<&Edge> for GraphEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            id: crate::model::edge_id(&edge.source, &edge.target),
            source: edge.source.clone(),
            target: edge.target.clone(),
            source_handle: edge.source_handle,
            label: edge.source_handle.label().to_string(),
            style: EdgeStyle {
                stroke: edge.source_handle.stroke().to_string(),
            },
        }
    }
}
