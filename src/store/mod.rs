//! Definition store access.
//!
//! The store is the canonical, name-keyed collection of state definitions.
//! Backends:
//! - `MemStore`: in-memory storage for testing and offline editing
//! - `HttpStore`: the `/api/states` REST surface

mod db;

use std::error::Error;

use async_trait::async_trait;

use crate::{
    Result, StateflowError,
    model::{Definitions, StateDefinition},
};

pub use db::{DEFAULT_PRIMITIVES, HttpStore, MemStore};

/// Maps transport errors to StateflowError.
fn map_store_err(err: impl Error) -> StateflowError {
    StateflowError::StoreUnavailable(err.to_string())
}

/// Remote operations the editor needs from a definition store.
#[async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Fetches every known state, keyed by name.
    async fn list_states(&self) -> Result<Definitions>;

    /// Creates or replaces a state and returns what the store kept.
    async fn upsert_state(
        &self,
        state: &StateDefinition,
    ) -> Result<StateDefinition>;

    /// Deletes a state by name.
    async fn delete_state(
        &self,
        name: &str,
    ) -> Result<()>;

    /// Writes every state of the flow in one request.
    async fn save_flow(
        &self,
        states: &Definitions,
    ) -> Result<()>;

    /// Fetches the ordered primitive catalog.
    async fn list_primitives(&self) -> Result<Vec<String>>;
}
