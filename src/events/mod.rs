//! Editor events.
//!
//! An event is published after a change has been committed to the graph
//! model, so a renderer that redraws on every event never shows
//! unconfirmed state.

use chrono::Utc;

use crate::model::{Handle, Position, StateName};

/// Generic event wrapper stamped with its commit time.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
    timestamp: i64,
}

/// Committed change to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A new state was confirmed by the store.
    StateAdded(StateName),
    /// The edge on `(source, handle)` now points at `target`.
    Connected {
        source: StateName,
        target: StateName,
        handle: Handle,
    },
    /// Position commit after a drag.
    Moved {
        name: StateName,
        position: Position,
    },
    /// The state's preliminary chain was replaced.
    PrimitivesAssigned(StateName),
    /// The state is gone; `cascade` lists the states rewritten to drop references to it.
    StateDeleted {
        name: StateName,
        cascade: Vec<StateName>,
    },
    /// The whole canvas was saved, this many states.
    FlowSaved(usize),
    /// The canvas was rebuilt from a full fetch holding this many states.
    Refreshed(usize),
    /// A full refetch should follow.
    RefreshRequested,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Commit time in milliseconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl EditorEvent {
    /// Name of the state the event is about, if any.
    pub fn state(&self) -> Option<&str> {
        match self {
            EditorEvent::StateAdded(name) | EditorEvent::PrimitivesAssigned(name) => Some(name),
            EditorEvent::Connected {
                source,
                ..
            } => Some(source),
            EditorEvent::Moved {
                name,
                ..
            }
            | EditorEvent::StateDeleted {
                name,
                ..
            } => Some(name),
            EditorEvent::FlowSaved(_) | EditorEvent::Refreshed(_) | EditorEvent::RefreshRequested => None,
        }
    }
}
