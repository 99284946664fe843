//! # Stateflow
//!
//! Stateflow keeps a visual node/edge canvas and a remote store of
//! state-machine definitions in sync. Each state carries at most one
//! `success` and one `failure` transition; the canvas draws them as
//! labelled, colour-coded edges.
//!
//! ## Core Features
//!
//! - **Apply after confirmation**: every edit is written to the store first and committed to the canvas only once the store accepted it
//! - **Atomic deletes**: deleting a state strips every reference to it from all other states, or changes nothing at all
//! - **Per-state serialization**: concurrent edits touching the same state are applied one after the other
//! - **Pluggable storage**: in-memory store for tests and offline editing, REST store for a remote backend
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stateflow::{EditorBuilder, MemStore, Position};
//!
//! let editor = EditorBuilder::new().store(Arc::new(MemStore::new())).build()?;
//! editor.load().await?;
//!
//! editor.add_state("A", Some(Position::new(10.0, 10.0))).await?;
//! editor.add_state("B", Some(Position::new(200.0, 10.0))).await?;
//! editor.connect("A", "B", "success").await?;
//! ```

mod builder;
mod common;
mod config;
mod dispatcher;
mod editor;
mod error;
mod events;
mod graph;
mod model;
mod projection;
mod selection;
mod store;

use std::sync::{Arc, RwLock};

pub use builder::EditorBuilder;
pub use config::{CanvasConfig, Config, HttpConfig, StoreConfig, StoreType};
pub use dispatcher::{Dispatcher, Intent, Outcome};
pub use editor::{Editor, RefreshOutcome};
pub use error::{ErrorKind, StateflowError};
pub use events::{EditorEvent, Event};
pub use graph::{EdgeStyle, GraphEdge, GraphModel, GraphNode, NodeId};
pub use model::*;
pub use projection::{DEFAULT_CANVAS_SIZE, Placement, from_definitions, to_definition, to_definitions};
pub use selection::{Panel, Selection};
pub use store::{DEFAULT_PRIMITIVES, DefinitionStore, HttpStore, MemStore};

/// Result type alias for Stateflow operations.
pub type Result<T> = std::result::Result<T, StateflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
