use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Edge, Handle, NO_TRANSITION};

/// State name, also used as the canvas node id.
pub type StateName = String;

/// Known definitions keyed by state name.
pub type Definitions = BTreeMap<StateName, StateDefinition>;

/// Canvas coordinates. Advisory only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(
        x: f64,
        y: f64,
    ) -> Self {
        Self {
            x,
            y,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveChain {
    #[serde(default, deserialize_with = "null_as_default")]
    pub primitives: Vec<String>,
    #[serde(default)]
    pub execution_order: i64,
}

/// Denormalized cache of the first edge per handle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transitions {
    #[serde(default = "no_transition", deserialize_with = "transition_target")]
    pub success: StateName,
    #[serde(default = "no_transition", deserialize_with = "transition_target")]
    pub failure: StateName,
}

impl Default for Transitions {
    fn default() -> Self {
        Self {
            success: no_transition(),
            failure: no_transition(),
        }
    }
}

impl Transitions {
    /// Derives transitions from the first edge of each handle.
    pub fn from_edges(edges: &[Edge]) -> Self {
        let target = |handle: Handle| edges.iter().find(|e| e.source_handle == handle).map(|e| e.target.clone()).unwrap_or_else(no_transition);

        Self {
            success: target(Handle::Success),
            failure: target(Handle::Failure),
        }
    }

    pub fn get(
        &self,
        handle: Handle,
    ) -> Option<&str> {
        let target = match handle {
            Handle::Success => &self.success,
            Handle::Failure => &self.failure,
        };
        (target != NO_TRANSITION).then_some(target.as_str())
    }

    pub fn references(
        &self,
        name: &str,
    ) -> bool {
        self.success == name || self.failure == name
    }
}

/// Canonical persisted unit of the state machine.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StateDefinition {
    pub name: StateName,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preliminary_actions: Vec<PrimitiveChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub transitions: Transitions,
}

impl StateDefinition {
    /// Creates an empty state: no actions, no edges, transitions `none/none`.
    pub fn new(
        name: &str,
        position: Option<Position>,
    ) -> Self {
        Self {
            name: name.to_string(),
            preliminary_actions: Vec::new(),
            main_action: None,
            position,
            edges: Vec::new(),
            transitions: Transitions::default(),
        }
    }

    /// The outgoing edge attached to `handle`, if any.
    pub fn outgoing(
        &self,
        handle: Handle,
    ) -> Option<&Edge> {
        self.edges.iter().find(|e| e.source_handle == handle)
    }

    /// Replaces the outgoing edge on `edge.source_handle` and refreshes transitions.
    pub fn replace_edge(
        &mut self,
        edge: Edge,
    ) {
        self.edges.retain(|e| e.source_handle != edge.source_handle);
        self.edges.push(edge);
        self.sync_transitions();
    }

    /// Keeps one edge per handle: the one `transitions` names, else the
    /// newest. Returns whether anything was dropped.
    pub fn dedup_edges(&mut self) -> bool {
        let before = self.edges.len();
        for handle in [Handle::Success, Handle::Failure] {
            let on_handle: Vec<usize> = self.edges.iter().enumerate().filter(|(_, e)| e.source_handle == handle).map(|(i, _)| i).collect();
            let Some(&newest) = on_handle.last() else {
                continue;
            };
            if on_handle.len() == 1 {
                continue;
            }

            let named = self.transitions.get(handle);
            let keep = on_handle.iter().copied().find(|&i| Some(self.edges[i].target.as_str()) == named).unwrap_or(newest);
            let mut index = 0;
            self.edges.retain(|e| {
                let stale = e.source_handle == handle && index != keep;
                index += 1;
                !stale
            });
        }
        self.edges.len() != before
    }

    pub fn sync_transitions(&mut self) {
        self.transitions = Transitions::from_edges(&self.edges);
    }

    /// Whether any edge or transition of this state points at `name`.
    pub fn references(
        &self,
        name: &str,
    ) -> bool {
        self.edges.iter().any(|e| e.target == name || e.source == name) || self.transitions.references(name)
    }

    /// Drops every edge touching `name` and resets transitions naming it.
    pub fn strip_references(
        &mut self,
        name: &str,
    ) {
        self.edges.retain(|e| e.target != name && e.source != name);
        if self.transitions.success == name {
            self.transitions.success = no_transition();
        }
        if self.transitions.failure == name {
            self.transitions.failure = no_transition();
        }
    }

    /// Primitives of the first preliminary chain.
    pub fn primitives(&self) -> Vec<String> {
        self.preliminary_actions.first().map(|c| c.primitives.clone()).unwrap_or_default()
    }
}

fn no_transition() -> StateName {
    NO_TRANSITION.to_string()
}

// stores written by older servers emit null for empty slices
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn transition_target<'de, D>(deserializer: D) -> std::result::Result<StateName, D::Error>
where
    D: Deserializer<'de>,
{
    let target = Option::<String>::deserialize(deserializer)?;
    Ok(target.filter(|t| !t.is_empty()).unwrap_or_else(no_transition))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_new_state_json_shape() {
        let state = StateDefinition::new("A", Some(Position::new(10.0, 10.0)));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "A",
                "preliminaryActions": [],
                "position": {"x": 10.0, "y": 10.0},
                "edges": [],
                "transitions": {"success": "none", "failure": "none"}
            })
        );
    }

    #[test]
    fn test_tolerates_null_and_empty_fields() {
        let state: StateDefinition = serde_json::from_value(json!({
            "name": "A",
            "preliminaryActions": null,
            "position": {"x": 1.0, "y": 2.0},
            "edges": null,
            "transitions": {"success": "", "failure": null}
        }))
        .unwrap();
        assert!(state.preliminary_actions.is_empty());
        assert!(state.edges.is_empty());
        assert_eq!(state.transitions, Transitions::default());
    }

    #[test]
    fn test_replace_edge_filters_same_handle() {
        let mut state = StateDefinition::new("A", None);
        state.replace_edge(Edge::new("A", "C", Handle::Failure));
        state.replace_edge(Edge::new("A", "B", Handle::Success));
        state.replace_edge(Edge::new("A", "D", Handle::Failure));

        assert_eq!(state.edges.len(), 2);
        assert_eq!(state.outgoing(Handle::Failure).unwrap().target, "D");
        assert_eq!(state.transitions.failure, "D");
        assert_eq!(state.transitions.success, "B");
        assert!(!state.references("C"));
    }

    #[test]
    fn test_dedup_edges_follows_transitions() {
        // appended without filtering; transitions name the newest edge
        let mut state = StateDefinition::new("A", None);
        state.edges = vec![Edge::new("A", "C", Handle::Failure), Edge::new("A", "B", Handle::Success), Edge::new("A", "D", Handle::Failure)];
        state.transitions.success = "B".to_string();
        state.transitions.failure = "D".to_string();

        assert!(state.dedup_edges());
        assert_eq!(state.edges, vec![Edge::new("A", "B", Handle::Success), Edge::new("A", "D", Handle::Failure)]);
        assert_eq!(state.transitions, Transitions::from_edges(&state.edges));
        assert!(!state.dedup_edges());
    }

    #[test]
    fn test_dedup_edges_keeps_newest_without_transition() {
        let mut state = StateDefinition::new("A", None);
        state.edges = vec![Edge::new("A", "C", Handle::Failure), Edge::new("A", "D", Handle::Failure)];

        assert!(state.dedup_edges());
        assert_eq!(state.outgoing(Handle::Failure).unwrap().target, "D");
        assert_eq!(state.edges.len(), 1);
    }

    #[test]
    fn test_strip_references() {
        let mut state = StateDefinition::new("A", None);
        state.replace_edge(Edge::new("A", "B", Handle::Success));
        state.replace_edge(Edge::new("A", "B", Handle::Failure));
        assert!(state.references("B"));

        state.strip_references("B");
        assert!(state.edges.is_empty());
        assert_eq!(state.transitions, Transitions::default());
        assert!(!state.references("B"));
    }

    #[test]
    fn test_stale_transition_is_a_reference() {
        let mut state = StateDefinition::new("A", None);
        state.transitions.success = "B".to_string();
        assert!(state.references("B"));
        assert_eq!(state.transitions.get(Handle::Success), Some("B"));
        assert_eq!(state.transitions.get(Handle::Failure), None);
    }

    #[test]
    fn test_primitives_of_first_chain() {
        let mut state = StateDefinition::new("A", None);
        assert!(state.primitives().is_empty());
        state.preliminary_actions.push(PrimitiveChain {
            primitives: vec!["validateOrder".into(), "shipOrder".into()],
            execution_order: 1,
        });
        assert_eq!(state.primitives(), vec!["validateOrder", "shipOrder"]);
    }
}
