mod definition;
mod edge;

pub use definition::{Definitions, Position, PrimitiveChain, StateDefinition, StateName, Transitions};
pub use edge::{Edge, EdgeId, Handle, NO_TRANSITION, edge_id};
