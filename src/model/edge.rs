//! Transition edges stored on a state definition.
//!
//! Every edge originates at the state that stores it and is attached to
//! one outcome handle.

use serde::{Deserialize, Serialize};

use crate::model::StateName;

/// Unique identifier for an edge, `"{source}-{target}"`.
pub type EdgeId = String;

/// Sentinel stored in `transitions` when a handle has no target.
pub const NO_TRANSITION: &str = "none";

/// Outcome discriminator an edge or transition is attached to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::AsRefStr, strum::EnumString, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Handle {
    Success,
    Failure,
}

impl Handle {
    /// Edge label shown on the canvas.
    pub fn label(&self) -> &'static str {
        match self {
            Handle::Success => "Success",
            Handle::Failure => "Failure",
        }
    }

    /// Edge stroke color shown on the canvas.
    pub fn stroke(&self) -> &'static str {
        match self {
            Handle::Success => "#4CAF50",
            Handle::Failure => "#F44336",
        }
    }
}

/// Outgoing transition as persisted in `StateDefinition::edges`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: EdgeId,
    pub source: StateName,
    pub target: StateName,
    pub source_handle: Handle,
}

impl Edge {
    pub fn new(
        source: &str,
        target: &str,
        handle: Handle,
    ) -> Self {
        Self {
            id: edge_id(source, target),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: handle,
        }
    }
}

pub fn edge_id(
    source: &str,
    target: &str,
) -> EdgeId {
    format!("{}-{}", source, target)
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::{Edge, Handle};

    #[test]
    fn test_handle_parse() {
        assert_eq!(Handle::from_str("success").unwrap(), Handle::Success);
        assert_eq!(Handle::from_str("failure").unwrap(), Handle::Failure);
        assert!(Handle::from_str("source").is_err());
        assert!(Handle::from_str("Success").is_err());
    }

    #[test]
    fn test_edge_json_shape() {
        let edge = Edge::new("A", "B", Handle::Failure);
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "A-B",
                "source": "A",
                "target": "B",
                "sourceHandle": "failure"
            })
        );
    }

    #[test]
    fn test_edge_without_id() {
        let edge: Edge = serde_json::from_str(r#"{"source":"A","target":"B","sourceHandle":"success"}"#).unwrap();
        assert_eq!(edge.id, "");
        assert_eq!(edge.source_handle, Handle::Success);
    }
}
