use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use tracing::trace;

use crate::{
    Result, ShareLock, StateflowError,
    model::{Definitions, StateDefinition},
    store::DefinitionStore,
};

/// Primitive catalog served when none is configured.
pub const DEFAULT_PRIMITIVES: [&str; 6] = ["validateOrder", "checkInventory", "processPayment", "allocateInventory", "generateShippingLabel", "shipOrder"];

/// In-memory definition store.
#[derive(Debug, Clone)]
pub struct MemStore {
    states: ShareLock<Definitions>,
    primitives: Vec<String>,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::with_states(BTreeMap::new())
    }

    pub fn with_states(states: Definitions) -> Self {
        Self {
            states: Arc::new(RwLock::new(states)),
            primitives: DEFAULT_PRIMITIVES.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn with_primitives(
        mut self,
        primitives: Vec<String>,
    ) -> Self {
        self.primitives = primitives;
        self
    }

    /// Snapshot of a stored state.
    pub fn get(
        &self,
        name: &str,
    ) -> Option<StateDefinition> {
        self.states.read().unwrap().get(name).cloned()
    }

    /// Snapshot of every stored state.
    pub fn snapshot(&self) -> Definitions {
        self.states.read().unwrap().clone()
    }
}

#[async_trait]
impl DefinitionStore for MemStore {
    async fn list_states(&self) -> Result<Definitions> {
        trace!("mem::list_states()");
        Ok(self.snapshot())
    }

    async fn upsert_state(
        &self,
        state: &StateDefinition,
    ) -> Result<StateDefinition> {
        trace!("mem::upsert_state({})", state.name);
        if state.name.is_empty() {
            return Err(StateflowError::InvalidName(state.name.clone()));
        }
        self.states.write().unwrap().insert(state.name.clone(), state.clone());
        Ok(state.clone())
    }

    async fn delete_state(
        &self,
        name: &str,
    ) -> Result<()> {
        trace!("mem::delete_state({})", name);
        self.states.write().unwrap().remove(name);
        Ok(())
    }

    async fn save_flow(
        &self,
        states: &Definitions,
    ) -> Result<()> {
        trace!("mem::save_flow({} states)", states.len());
        if let Some(state) = states.values().find(|s| s.name.is_empty()) {
            return Err(StateflowError::InvalidName(state.name.clone()));
        }
        self.states.write().unwrap().extend(states.iter().map(|(name, state)| (name.clone(), state.clone())));
        Ok(())
    }

    async fn list_primitives(&self) -> Result<Vec<String>> {
        Ok(self.primitives.clone())
    }
}
