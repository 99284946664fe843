//! Mutation coordinator.
//!
//! The editor owns the canvas graph and the arena of known definitions and
//! turns every user intent into store writes. The policy is the same for
//! every intent:
//! - validate locally, before any store call
//! - lock every state the intent reads or writes
//! - write to the store
//! - only after the store confirmed, commit to the arena and the graph
//!
//! A failed intent leaves the graph exactly as it was.

mod locks;

use std::{
    str::FromStr,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use crate::{
    Result, ShareLock, StateflowError,
    common::{BroadcastQueue, MemCache},
    events::{EditorEvent, Event},
    graph::{GraphEdge, GraphModel, GraphNode},
    model::{Definitions, Edge, Handle, Position, PrimitiveChain, StateDefinition, StateName},
    projection::{self, Placement},
    selection::{Panel, Selection},
    store::DefinitionStore,
};

use locks::StateLocks;

/// Capacity of the editor event queue.
const EVENT_QUEUE_SIZE: usize = 1024;
/// How long the primitive catalog is trusted before refetching.
const CATALOG_TTL: Duration = Duration::from_secs(300);
const CATALOG_KEY: &str = "primitives";

/// Result of a full refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The canvas was rebuilt from this many states.
    Applied(usize),
    /// A newer fetch or a local commit happened meanwhile; the response was dropped.
    Stale,
}

/// The graph/state-machine synchronization engine.
///
/// # Example
///
/// ```rust,ignore
/// let editor = EditorBuilder::new().store(Arc::new(MemStore::new())).build()?;
/// editor.load().await?;
///
/// editor.add_state("A", Some(Position::new(10.0, 10.0))).await?;
/// editor.add_state("B", Some(Position::new(200.0, 10.0))).await?;
/// editor.connect("A", "B", "success").await?;
/// editor.delete_state("B").await?;
/// ```
pub struct Editor {
    /// Canonical definition store.
    store: Arc<dyn DefinitionStore>,
    /// Canvas graph, rebuilt on refresh and patched on commit.
    graph: GraphModel,
    /// Every known definition, keyed by name.
    definitions: ShareLock<Definitions>,
    /// Positions for states stored without one.
    placement: Mutex<Placement>,
    /// Per-state serialization of intents.
    locks: StateLocks,
    /// Advanced by every commit, every issued fetch and both ends of every store write.
    epoch: AtomicU64,
    /// Store writes issued and not yet finished.
    in_flight: AtomicUsize,
    /// Side-panel selection.
    selection: Selection,
    /// Cached primitive catalog.
    catalog: MemCache<&'static str, Vec<String>>,
    /// Committed changes, for renderers.
    events: Arc<BroadcastQueue<Event<EditorEvent>>>,
}

impl Editor {
    /// Creates an editor over `store` with the default placement region.
    pub fn new(store: Arc<dyn DefinitionStore>) -> Self {
        Self::with_placement(store, Placement::default())
    }

    pub fn with_placement(
        store: Arc<dyn DefinitionStore>,
        placement: Placement,
    ) -> Self {
        Self {
            store,
            graph: GraphModel::new(),
            definitions: Arc::new(RwLock::new(Definitions::new())),
            placement: Mutex::new(placement),
            locks: StateLocks::new(),
            epoch: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            selection: Selection::new(),
            catalog: MemCache::new(1, CATALOG_TTL),
            events: BroadcastQueue::new(EVENT_QUEUE_SIZE),
        }
    }

    /// The canvas graph. Read-only outside the editor.
    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Snapshot of every known definition.
    pub fn definitions(&self) -> Definitions {
        self.definitions.read().unwrap().clone()
    }

    /// Known definition of `name`, with its canvas position filled in when
    /// the store never recorded one.
    pub fn definition(
        &self,
        name: &str,
    ) -> Option<StateDefinition> {
        let mut state = self.definitions.read().unwrap().get(name).cloned()?;
        if state.position.is_none() {
            state.position = self.graph.node(name).map(|n| n.position);
        }
        Some(state)
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.definitions.read().unwrap().contains_key(name)
    }

    /// Subscribe to committed changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event<EditorEvent>> {
        self.events.subscribe()
    }

    /// Initial load of the canvas.
    pub async fn load(&self) -> Result<RefreshOutcome> {
        self.refresh().await
    }

    /// Refetches every state and rebuilds the canvas.
    ///
    /// The response is dropped when another fetch was issued, or a store
    /// write was pending or finished while it was in flight, since it may
    /// show a half-written change.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("editor::refresh(ticket {})", ticket);
        let mut fetched = self.store.list_states().await.inspect_err(|e| warn!("refresh failed: {}", e))?;
        for state in fetched.values_mut() {
            if state.dedup_edges() {
                debug!("state {} stores several edges on one handle, keeping one each", state.name);
            }
        }

        let count = fetched.len();
        {
            let mut defs = self.definitions.write().unwrap();
            let current = self.epoch.load(Ordering::SeqCst);
            let pending = self.in_flight.load(Ordering::SeqCst);
            if current != ticket || pending > 0 {
                warn!("dropping stale refresh (ticket {}, epoch {}, {} writes pending)", ticket, current, pending);
                return Ok(RefreshOutcome::Stale);
            }

            let (nodes, edges) = projection::from_definitions(&fetched, &mut self.placement.lock().unwrap());
            self.graph.replace(nodes, edges);
            if self.selection.selected().is_some_and(|s| !fetched.contains_key(&s)) {
                self.selection.clear();
            }
            *defs = fetched;
        }

        info!("canvas refreshed with {} states", count);
        self.publish(EditorEvent::Refreshed(count));
        Ok(RefreshOutcome::Applied(count))
    }

    /// Creates an empty state. The node appears only once the store confirmed it.
    pub async fn add_state(
        &self,
        name: &str,
        position: Option<Position>,
    ) -> Result<StateDefinition> {
        validate_name(name)?;
        let _locks = self.locks.lock(&[name]).await;
        if self.contains(name) || self.graph.contains(name) {
            return Err(StateflowError::DuplicateName(name.to_string()));
        }

        let position = position.unwrap_or_else(|| self.placement.lock().unwrap().point());
        let state = StateDefinition::new(name, Some(position));
        let _write = self.begin_write();
        let stored = self.store.upsert_state(&state).await.inspect_err(|e| warn!("add_state({}) failed: {}", name, e))?;

        self.commit(|defs, graph| {
            graph.insert_node(GraphNode::new(name, stored.position.unwrap_or(position)));
            defs.insert(name.to_string(), stored.clone());
        });
        info!("state {} added", name);
        self.publish(EditorEvent::StateAdded(name.to_string()));
        Ok(stored)
    }

    /// Points the `handle` transition of `source` at `target`, replacing any
    /// edge already on that handle.
    pub async fn connect(
        &self,
        source: &str,
        target: &str,
        handle: &str,
    ) -> Result<StateDefinition> {
        let handle = Handle::from_str(handle).map_err(|_| StateflowError::InvalidConnection(format!("unsupported handle '{}'", handle)))?;
        let _locks = self.locks.lock(&[source, target]).await;

        let mut state = self.definition(source).ok_or_else(|| StateflowError::InvalidConnection(format!("unknown source state '{}'", source)))?;
        if !self.contains(target) {
            return Err(StateflowError::InvalidConnection(format!("unknown target state '{}'", target)));
        }

        state.replace_edge(Edge::new(source, target, handle));
        debug!("connect {} --[{}]--> {}", source, handle, target);
        let _write = self.begin_write();
        let stored = self.store.upsert_state(&state).await.inspect_err(|e| warn!("connect({}, {}) failed: {}", source, target, e))?;

        self.commit(|defs, graph| {
            sync_outgoing(graph, &stored);
            defs.insert(source.to_string(), stored.clone());
        });
        info!("state {} {} transition set to {}", source, handle, target);
        self.publish(EditorEvent::Connected {
            source: source.to_string(),
            target: target.to_string(),
            handle,
        });
        Ok(stored)
    }

    /// Commits a node position after a drag.
    ///
    /// Transitions are recomputed from the stored edges; actions and edges
    /// are written back unchanged, so repeating a move is a no-op.
    pub async fn move_state(
        &self,
        name: &str,
        position: Position,
    ) -> Result<StateDefinition> {
        let _locks = self.locks.lock(&[name]).await;
        let mut state = self.definition(name).ok_or_else(|| StateflowError::NotFound(name.to_string()))?;

        state.position = Some(position);
        state.sync_transitions();
        let _write = self.begin_write();
        let stored = self.store.upsert_state(&state).await.inspect_err(|e| warn!("move_state({}) failed: {}", name, e))?;

        self.commit(|defs, graph| {
            graph.set_position(name, stored.position.unwrap_or(position));
            defs.insert(name.to_string(), stored.clone());
        });
        debug!("state {} moved to ({}, {})", name, position.x, position.y);
        self.publish(EditorEvent::Moved {
            name: name.to_string(),
            position,
        });
        Ok(stored)
    }

    /// Replaces the preliminary actions of `name` with one chain and closes the panel.
    pub async fn assign_primitives(
        &self,
        name: &str,
        primitives: Vec<String>,
    ) -> Result<StateDefinition> {
        let _locks = self.locks.lock(&[name]).await;
        let mut state = self.definition(name).ok_or_else(|| StateflowError::NotFound(name.to_string()))?;

        state.preliminary_actions = vec![PrimitiveChain {
            primitives,
            execution_order: 1,
        }];
        let _write = self.begin_write();
        let stored = self.store.upsert_state(&state).await.inspect_err(|e| warn!("assign_primitives({}) failed: {}", name, e))?;

        self.commit(|defs, _| {
            defs.insert(name.to_string(), stored.clone());
        });
        self.selection.clear();
        info!("state {} primitives set to {:?}", name, stored.primitives());
        self.publish(EditorEvent::PrimitivesAssigned(name.to_string()));
        Ok(stored)
    }

    /// Deletes `name` and strips every reference to it from all known states.
    ///
    /// Referencing states are rewritten first and the state itself is deleted
    /// last. If any write fails, the rewrites that already landed are undone,
    /// the graph is left untouched and the first error is returned. Returns
    /// the names of the rewritten states.
    pub async fn delete_state(
        &self,
        name: &str,
    ) -> Result<Vec<StateName>> {
        let (_locks, cascade) = loop {
            let mut names = self.referencing(name);
            names.push(name.to_string());
            let locks = self.locks.lock(&names).await;

            if !self.contains(name) {
                return Err(StateflowError::NotFound(name.to_string()));
            }
            let cascade = self.referencing(name);
            if cascade.iter().all(|n| locks.covers(n)) {
                break (locks, cascade);
            }
            debug!("references to {} changed while locking, retrying", name);
        };

        let updates: Vec<(StateDefinition, StateDefinition)> = cascade
            .iter()
            .filter_map(|n| self.definition(n))
            .map(|original| {
                let mut updated = original.clone();
                updated.strip_references(name);
                (original, updated)
            })
            .collect();
        debug!("delete {} rewrites {:?}", name, cascade);

        let _write = self.begin_write();
        let results = join_all(updates.iter().map(|(_, updated)| self.store.upsert_state(updated))).await;
        let mut stored = Vec::with_capacity(updates.len());
        let mut failure = None;
        for ((original, _), result) in updates.iter().zip(results) {
            match result {
                Ok(state) => stored.push((original, state)),
                Err(err) => {
                    warn!("delete_state({}) could not rewrite {}: {}", name, original.name, err);
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            self.restore(stored.iter().map(|(original, _)| *original)).await;
            return Err(err);
        }

        if let Err(err) = self.store.delete_state(name).await {
            warn!("delete_state({}) failed: {}", name, err);
            self.restore(updates.iter().map(|(original, _)| original)).await;
            return Err(err);
        }

        self.commit(|defs, graph| {
            graph.remove_node(name);
            defs.remove(name);
            for (_, state) in &stored {
                sync_outgoing(graph, state);
                defs.insert(state.name.clone(), state.clone());
            }
        });
        self.selection.clear_if(name);
        info!("state {} deleted, {} states rewritten", name, cascade.len());
        self.publish(EditorEvent::StateDeleted {
            name: name.to_string(),
            cascade: cascade.clone(),
        });
        self.publish(EditorEvent::RefreshRequested);
        Ok(cascade)
    }

    /// Writes the whole canvas to the store in one request, then refetches.
    ///
    /// Positions and edges come from the graph, actions from the known
    /// definitions. Returns the number of states saved.
    pub async fn save_flow(&self) -> Result<usize> {
        let names: Vec<StateName> = self.definitions.read().unwrap().keys().cloned().collect();
        let _locks = self.locks.lock(&names).await;

        let states = {
            let defs = self.definitions.read().unwrap();
            projection::to_definitions(&self.graph.nodes(), &self.graph.edges(), &defs)
        };
        let count = states.len();

        let write = self.begin_write();
        self.store.save_flow(&states).await.inspect_err(|e| warn!("save_flow failed: {}", e))?;
        self.commit(|defs, _| *defs = states);
        drop(write);

        info!("flow saved with {} states", count);
        self.publish(EditorEvent::FlowSaved(count));
        if let Err(err) = self.refresh().await {
            warn!("refetch after saving the flow failed: {}", err);
        }
        Ok(count)
    }

    /// The primitive catalog, cached after the first fetch.
    pub async fn primitives(&self) -> Result<Vec<String>> {
        if let Some(catalog) = self.catalog.get(&CATALOG_KEY) {
            return Ok(catalog);
        }
        let catalog = self.store.list_primitives().await?;
        self.catalog.set(CATALOG_KEY, catalog.clone());
        Ok(catalog)
    }

    /// Drops the cached catalog and fetches it again.
    pub async fn refresh_primitives(&self) -> Result<Vec<String>> {
        self.catalog.remove(&CATALOG_KEY);
        self.primitives().await
    }

    /// Opens the side panel of `name`, pre-checking its first chain.
    pub fn open_panel(
        &self,
        name: &str,
    ) -> Result<Panel> {
        let state = self.definition(name).ok_or_else(|| StateflowError::NotFound(name.to_string()))?;
        Ok(self.selection.open(Panel::new(name, state.primitives())))
    }

    pub fn toggle_primitive(
        &self,
        primitive: &str,
    ) -> Result<Panel> {
        self.selection.toggle(primitive).ok_or(StateflowError::NoSelection)
    }

    /// Persists the open panel's checklist.
    pub async fn confirm_panel(&self) -> Result<StateDefinition> {
        let panel = self.selection.current().ok_or(StateflowError::NoSelection)?;
        self.assign_primitives(&panel.state, panel.checked).await
    }

    /// Closes the panel without writing anything.
    pub fn cancel_panel(&self) {
        self.selection.clear();
    }

    /// Names of all other known states whose edges or transitions mention `name`.
    fn referencing(
        &self,
        name: &str,
    ) -> Vec<StateName> {
        self.definitions.read().unwrap().values().filter(|d| d.name != name && d.references(name)).map(|d| d.name.clone()).collect()
    }

    /// Best-effort write-back of definitions after a failed cascade.
    async fn restore<'a>(
        &self,
        originals: impl Iterator<Item = &'a StateDefinition>,
    ) {
        let originals: Vec<&StateDefinition> = originals.collect();
        let results = join_all(originals.iter().map(|state| self.store.upsert_state(state))).await;
        for (state, result) in originals.iter().zip(results) {
            if let Err(err) = result {
                warn!("could not restore {} after failed delete: {}", state.name, err);
            }
        }
    }

    /// Marks a store write as pending until the returned guard drops.
    fn begin_write(&self) -> PendingWrite<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        PendingWrite {
            editor: self,
        }
    }

    /// Applies a confirmed change to the arena and the graph.
    fn commit<R>(
        &self,
        apply: impl FnOnce(&mut Definitions, &GraphModel) -> R,
    ) -> R {
        let mut defs = self.definitions.write().unwrap();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        apply(&mut defs, &self.graph)
    }

    fn publish(
        &self,
        event: EditorEvent,
    ) {
        if let Err(err) = self.events.send(Event::new(event)) {
            trace!("editor event dropped: {}", err);
        }
    }
}

struct PendingWrite<'a> {
    editor: &'a Editor,
}

impl Drop for PendingWrite<'_> {
    fn drop(&mut self) {
        // epoch first, so a refresh never sees the count drop without the bump
        self.editor.epoch.fetch_add(1, Ordering::SeqCst);
        self.editor.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Rejects names that cannot serve as a node id and store key.
fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('/') {
        return Err(StateflowError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Mirrors the stored outgoing edges of `state` onto the graph.
fn sync_outgoing(
    graph: &GraphModel,
    state: &StateDefinition,
) {
    for handle in [Handle::Success, Handle::Failure] {
        match state.outgoing(handle) {
            Some(edge) => {
                if !graph.set_edge(GraphEdge::from(edge)) {
                    warn!("edge {} of {} points at an unknown state", edge.id, state.name);
                    graph.clear_edge(&state.name, handle);
                }
            }
            None => graph.clear_edge(&state.name, handle),
        }
    }
}
