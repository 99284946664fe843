use serde::{Deserialize, Serialize};

use crate::model::Position;

/// node id, identical to the state name
pub type NodeId = String;

/// A state as drawn on the canvas.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
}

impl GraphNode {
    pub fn new(
        id: &str,
        position: Position,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            position,
        }
    }
}
