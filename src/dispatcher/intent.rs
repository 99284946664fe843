use tokio::sync::oneshot;

use crate::{
    Result,
    editor::RefreshOutcome,
    model::{Position, StateDefinition, StateName},
    selection::Panel,
};

/// User intent coming from a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    AddState {
        name: StateName,
        position: Option<Position>,
    },
    Connect {
        source: StateName,
        target: StateName,
        /// `"success"` or `"failure"`
        handle: String,
    },
    Move {
        name: StateName,
        position: Position,
    },
    Delete {
        name: StateName,
    },
    OpenPanel {
        name: StateName,
    },
    TogglePrimitive {
        primitive: String,
    },
    ConfirmPanel,
    CancelPanel,
    SaveFlow,
    Refresh,
}

/// What an applied intent produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The definition as the store kept it.
    State(StateDefinition),
    /// States rewritten by a delete cascade.
    Deleted(Vec<StateName>),
    Panel(Panel),
    /// Number of states written by a flow save.
    Saved(usize),
    Refreshed(RefreshOutcome),
    /// Nothing to report.
    Done,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::AddState {
                ..
            } => "add_state",
            Intent::Connect {
                ..
            } => "connect",
            Intent::Move {
                ..
            } => "move",
            Intent::Delete {
                ..
            } => "delete",
            Intent::OpenPanel {
                ..
            } => "open_panel",
            Intent::TogglePrimitive {
                ..
            } => "toggle_primitive",
            Intent::ConfirmPanel => "confirm_panel",
            Intent::CancelPanel => "cancel_panel",
            Intent::SaveFlow => "save_flow",
            Intent::Refresh => "refresh",
        }
    }
}

/// An intent waiting in the command queue with its reply channel.
pub(crate) struct Command {
    pub intent: Intent,
    pub reply: oneshot::Sender<Result<Outcome>>,
}
