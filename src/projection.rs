//! Mapping between the definition store shape and the canvas shape.
//!
//! Both directions are pure. `from_definitions` only needs randomness for
//! states that were never placed; that draw comes from a caller-owned
//! [`Placement`] so a seeded placement yields a deterministic canvas.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    graph::{GraphEdge, GraphNode},
    model::{Definitions, Handle, Position, StateDefinition, Transitions},
};

/// Default canvas region used for unplaced states.
pub const DEFAULT_CANVAS_SIZE: f64 = 500.0;

/// Source of positions for states without a stored one.
#[derive(Debug, Clone)]
pub struct Placement {
    width: f64,
    height: f64,
    rng: StdRng,
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE, None)
    }
}

impl Placement {
    /// Uniform placement in `[0, width] x [0, height]`; `seed` makes it reproducible.
    pub fn new(
        width: f64,
        height: f64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            rng,
        }
    }

    pub fn point(&mut self) -> Position {
        let x = if self.width > 0.0 { self.rng.gen_range(0.0..=self.width) } else { 0.0 };
        let y = if self.height > 0.0 { self.rng.gen_range(0.0..=self.height) } else { 0.0 };
        Position::new(x, y)
    }
}

/// Projects definitions onto canvas nodes and edges.
///
/// Nodes come out ordered by name and edges by source then handle. Positions
/// drawn from `placement` are not written back to `defs`.
pub fn from_definitions(
    defs: &Definitions,
    placement: &mut Placement,
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut nodes = Vec::with_capacity(defs.len());
    let mut edges = Vec::new();

    for (name, def) in defs {
        let position = def.position.unwrap_or_else(|| placement.point());
        nodes.push(GraphNode::new(name, position));

        // the edge `Transitions::from_edges` reads, one per handle
        edges.extend([Handle::Success, Handle::Failure].into_iter().filter_map(|h| def.outgoing(h)).map(GraphEdge::from));
    }

    (nodes, edges)
}

/// Rebuilds definitions from the canvas.
///
/// Action chains are never derived from the canvas: they are copied from
/// `prior`, and states missing from `prior` get empty chains.
pub fn to_definitions(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    prior: &Definitions,
) -> Definitions {
    nodes
        .iter()
        .map(|node| {
            let mut def = prior.get(&node.id).cloned().unwrap_or_else(|| StateDefinition::new(&node.id, None));
            let mut outgoing: Vec<&GraphEdge> = edges.iter().filter(|e| e.source == node.id).collect();
            outgoing.sort_by_key(|e| e.source_handle);

            def.name = node.id.clone();
            def.position = Some(node.position);
            def.edges = outgoing.into_iter().map(GraphEdge::to_edge).collect();
            def.transitions = Transitions::from_edges(&def.edges);
            (node.id.clone(), def)
        })
        .collect()
}

/// Projects a single state, reusing `prior` for everything the canvas does not hold.
pub fn to_definition(
    node: &GraphNode,
    edges: &[GraphEdge],
    prior: &Definitions,
) -> StateDefinition {
    let mut defs = to_definitions(std::slice::from_ref(node), edges, prior);
    defs.remove(&node.id).unwrap_or_else(|| StateDefinition::new(&node.id, Some(node.position)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, PrimitiveChain};

    fn state(
        name: &str,
        x: f64,
        edges: Vec<Edge>,
    ) -> StateDefinition {
        let mut def = StateDefinition::new(name, Some(Position::new(x, 10.0)));
        def.edges = edges;
        def.sync_transitions();
        def
    }

    fn sample() -> Definitions {
        let mut a = state("A", 10.0, vec![Edge::new("A", "C", Handle::Failure), Edge::new("A", "B", Handle::Success)]);
        a.preliminary_actions.push(PrimitiveChain {
            primitives: vec!["validateOrder".into(), "checkInventory".into()],
            execution_order: 1,
        });
        a.main_action = Some("shipOrder".into());

        let b = state("B", 200.0, vec![Edge::new("B", "A", Handle::Failure)]);
        let c = state("C", 400.0, vec![]);

        [a, b, c].into_iter().map(|d| (d.name.clone(), d)).collect()
    }

    fn normalized(mut defs: Definitions) -> Definitions {
        for def in defs.values_mut() {
            def.edges.sort_by_key(|e| e.source_handle);
        }
        defs
    }

    #[test]
    fn test_round_trip() {
        let defs = sample();
        let (nodes, edges) = from_definitions(&defs, &mut Placement::default());
        let back = to_definitions(&nodes, &edges, &defs);
        assert_eq!(normalized(back), normalized(defs));
    }

    #[test]
    fn test_edge_ids_and_styles() {
        let (nodes, edges) = from_definitions(&sample(), &mut Placement::default());
        assert_eq!(nodes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(), vec!["A", "B", "C"]);

        let ab = edges.iter().find(|e| e.id == "A-B").unwrap();
        assert_eq!(ab.label, "Success");
        assert_eq!(ab.style.stroke, "#4CAF50");
        let ac = edges.iter().find(|e| e.id == "A-C").unwrap();
        assert_eq!(ac.label, "Failure");
        assert_eq!(ac.style.stroke, "#F44336");
    }

    #[test]
    fn test_one_edge_per_handle_on_canvas() {
        let mut defs = sample();
        defs.get_mut("B").unwrap().edges.push(Edge::new("B", "C", Handle::Failure));

        let (_, edges) = from_definitions(&defs, &mut Placement::default());
        let from_b: Vec<&GraphEdge> = edges.iter().filter(|e| e.source == "B").collect();
        assert_eq!(from_b.len(), 1);
        assert_eq!(from_b[0].target, defs["B"].transitions.failure);
    }

    #[test]
    fn test_unplaced_state_gets_point_in_region() {
        let mut defs = sample();
        defs.get_mut("C").unwrap().position = None;

        let (nodes, _) = from_definitions(&defs, &mut Placement::new(500.0, 500.0, Some(7)));
        let c = nodes.iter().find(|n| n.id == "C").unwrap();
        assert!((0.0..=500.0).contains(&c.position.x));
        assert!((0.0..=500.0).contains(&c.position.y));
        // the projection does not persist the drawn position
        assert!(defs["C"].position.is_none());
    }

    #[test]
    fn test_seeded_placement_is_deterministic() {
        let mut defs = sample();
        for def in defs.values_mut() {
            def.position = None;
        }
        let first = from_definitions(&defs, &mut Placement::new(500.0, 500.0, Some(42)));
        let second = from_definitions(&defs, &mut Placement::new(500.0, 500.0, Some(42)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_definitions_keeps_prior_actions() {
        let defs = sample();
        let (mut nodes, mut edges) = from_definitions(&defs, &mut Placement::default());
        nodes[0].position = Position::new(1.0, 2.0);
        edges.retain(|e| e.id != "A-B");

        let back = to_definitions(&nodes, &edges, &defs);
        let a = &back["A"];
        assert_eq!(a.position, Some(Position::new(1.0, 2.0)));
        assert_eq!(a.transitions.success, "none");
        assert_eq!(a.transitions.failure, "C");
        assert_eq!(a.primitives(), vec!["validateOrder", "checkInventory"]);
        assert_eq!(a.main_action.as_deref(), Some("shipOrder"));
    }

    #[test]
    fn test_to_definition_for_new_node() {
        let node = GraphNode::new("Z", Position::new(3.0, 4.0));
        let def = to_definition(&node, &[], &Definitions::new());
        assert_eq!(def, StateDefinition::new("Z", Some(Position::new(3.0, 4.0))));
    }
}
