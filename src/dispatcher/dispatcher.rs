//! Intent dispatcher.
//!
//! Renderers push intents into a bounded command queue; one worker task
//! applies them against the editor in arrival order and answers each on
//! its own reply channel.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::{
    Result, StateflowError,
    common::{Queue, Shutdown},
    editor::Editor,
};

use super::intent::{Command, Intent, Outcome};

/// Capacity of the command queue.
const COMMAND_QUEUE_SIZE: usize = 256;

/// Sequential intent executor in front of an [`Editor`].
pub struct Dispatcher {
    /// The editor intents are applied to.
    editor: Arc<Editor>,
    /// Queue for receiving intents.
    command_queue: Arc<Queue<Command>>,
    /// Shutdown coordinator.
    shutdown: Arc<Shutdown>,
}

impl Dispatcher {
    pub fn new(editor: Arc<Editor>) -> Self {
        Self {
            editor,
            command_queue: Queue::new(COMMAND_QUEUE_SIZE),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn editor(&self) -> &Arc<Editor> {
        &self.editor
    }

    /// Starts the worker loop. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let editor = self.editor.clone();
        let command_queue = self.command_queue.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = shutdown.wait() => break,

                    cmd_opt = command_queue.next_async() => {
                        let Some(Command { intent, reply }) = cmd_opt else {
                            break;
                        };
                        let name = intent.name();
                        let result = Self::apply(&editor, intent).await;
                        if reply.send(result).is_err() {
                            trace!("dispatcher: caller of {} went away", name);
                        }
                    }
                }
            }

            // pending callers get a closed reply channel
            let mut dropped = 0;
            while command_queue.try_next().is_some() {
                dropped += 1;
            }
            debug!("dispatcher stopped, {} pending intents dropped", dropped);
        });
    }

    /// Queues `intent` and waits for its outcome.
    pub async fn send(
        &self,
        intent: Intent,
    ) -> Result<Outcome> {
        if self.shutdown.is_shutdown() {
            return Err(StateflowError::Queue("dispatcher is shut down".to_string()));
        }

        let (reply, rx) = oneshot::channel();
        self.command_queue
            .send_async(Command {
                intent,
                reply,
            })
            .await?;
        rx.await.map_err(|_| StateflowError::Queue("dispatcher stopped before replying".to_string()))?
    }

    /// Stops the worker loop.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_shutdown()
    }

    async fn apply(
        editor: &Editor,
        intent: Intent,
    ) -> Result<Outcome> {
        trace!("dispatcher::apply({})", intent.name());
        match intent {
            Intent::AddState {
                name,
                position,
            } => editor.add_state(&name, position).await.map(Outcome::State),
            Intent::Connect {
                source,
                target,
                handle,
            } => editor.connect(&source, &target, &handle).await.map(Outcome::State),
            Intent::Move {
                name,
                position,
            } => editor.move_state(&name, position).await.map(Outcome::State),
            Intent::Delete {
                name,
            } => {
                let cascade = editor.delete_state(&name).await?;
                if let Err(err) = editor.refresh().await {
                    warn!("refetch after deleting {} failed: {}", name, err);
                }
                Ok(Outcome::Deleted(cascade))
            }
            Intent::OpenPanel {
                name,
            } => editor.open_panel(&name).map(Outcome::Panel),
            Intent::TogglePrimitive {
                primitive,
            } => editor.toggle_primitive(&primitive).map(Outcome::Panel),
            Intent::ConfirmPanel => editor.confirm_panel().await.map(Outcome::State),
            Intent::CancelPanel => {
                editor.cancel_panel();
                Ok(Outcome::Done)
            }
            Intent::SaveFlow => editor.save_flow().await.map(Outcome::Saved),
            Intent::Refresh => editor.refresh().await.map(Outcome::Refreshed),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{Dispatcher, Editor, ErrorKind, Intent, MemStore, Outcome, Position, RefreshOutcome, StateDefinition};

    fn dispatcher() -> (Arc<MemStore>, Dispatcher) {
        let b = StateDefinition::new("B", Some(Position::new(200.0, 10.0)));
        let store = Arc::new(MemStore::with_states([("B".to_string(), b)].into_iter().collect()));
        let dispatcher = Dispatcher::new(Arc::new(Editor::new(store.clone())));
        dispatcher.start();
        (store, dispatcher)
    }

    #[tokio::test]
    async fn test_intents_apply_in_order() {
        let (store, dispatcher) = dispatcher();

        let loaded = dispatcher.send(Intent::Refresh).await.unwrap();
        assert_eq!(loaded, Outcome::Refreshed(RefreshOutcome::Applied(1)));

        dispatcher
            .send(Intent::AddState {
                name: "A".into(),
                position: Some(Position::new(10.0, 10.0)),
            })
            .await
            .unwrap();
        let Outcome::State(a) = dispatcher
            .send(Intent::Connect {
                source: "A".into(),
                target: "B".into(),
                handle: "success".into(),
            })
            .await
            .unwrap()
        else {
            panic!("connect should return the stored state");
        };
        assert_eq!(a.transitions.success, "B");

        let deleted = dispatcher
            .send(Intent::Delete {
                name: "B".into(),
            })
            .await
            .unwrap();
        assert_eq!(deleted, Outcome::Deleted(vec!["A".into()]));
        assert_eq!(store.get("A").unwrap().transitions.success, "none");
        assert_eq!(dispatcher.editor().graph().node_count(), 1);

        assert_eq!(dispatcher.send(Intent::SaveFlow).await.unwrap(), Outcome::Saved(1));
    }

    #[tokio::test]
    async fn test_panel_intents() {
        let (store, dispatcher) = dispatcher();
        dispatcher.send(Intent::Refresh).await.unwrap();

        dispatcher
            .send(Intent::OpenPanel {
                name: "B".into(),
            })
            .await
            .unwrap();
        let toggled = dispatcher
            .send(Intent::TogglePrimitive {
                primitive: "shipOrder".into(),
            })
            .await
            .unwrap();
        let Outcome::Panel(panel) = toggled else {
            panic!("toggle should return the panel");
        };
        assert_eq!(panel.checked, vec!["shipOrder"]);

        dispatcher.send(Intent::ConfirmPanel).await.unwrap();
        assert_eq!(store.get("B").unwrap().primitives(), vec!["shipOrder"]);

        assert_eq!(dispatcher.send(Intent::CancelPanel).await.unwrap(), Outcome::Done);
        let err = dispatcher.send(Intent::ConfirmPanel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSelection);
    }

    #[tokio::test]
    async fn test_errors_are_returned_to_sender() {
        let (_, dispatcher) = dispatcher();
        let err = dispatcher
            .send(Intent::Connect {
                source: "B".into(),
                target: "B".into(),
                handle: "maybe".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConnection);

        // the worker keeps going after a failed intent
        assert!(dispatcher.send(Intent::Refresh).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_after_shutdown() {
        let (_, dispatcher) = dispatcher();
        dispatcher.shutdown();
        assert!(dispatcher.is_shutdown());

        let err = dispatcher.send(Intent::Refresh).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Queue);
    }
}
