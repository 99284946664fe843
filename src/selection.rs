//! Side-panel selection.
//!
//! Tracks the single state whose primitive checklist is open. Persistence
//! of a confirmed checklist goes through the editor.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::{ShareLock, model::StateName};

/// Open checklist for one state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub state: StateName,
    /// Checked primitives, in the order they were checked.
    pub checked: Vec<String>,
}

impl Panel {
    pub fn new(
        state: &str,
        checked: Vec<String>,
    ) -> Self {
        Self {
            state: state.to_string(),
            checked,
        }
    }

    /// Checks `primitive`, or unchecks it when already checked.
    pub fn toggle(
        &mut self,
        primitive: &str,
    ) {
        if let Some(pos) = self.checked.iter().position(|p| p == primitive) {
            self.checked.remove(pos);
        } else {
            self.checked.push(primitive.to_string());
        }
    }
}

/// At most one open panel at a time.
#[derive(Clone, Default)]
pub struct Selection {
    panel: ShareLock<Option<Panel>>,
}

impl Selection {
    pub fn new() -> Self {
        Self {
            panel: Arc::new(RwLock::new(None)),
        }
    }

    /// Opens `panel`, replacing whatever was open.
    pub fn open(
        &self,
        panel: Panel,
    ) -> Panel {
        *self.panel.write().unwrap() = Some(panel.clone());
        panel
    }

    pub fn current(&self) -> Option<Panel> {
        self.panel.read().unwrap().clone()
    }

    pub fn selected(&self) -> Option<StateName> {
        self.panel.read().unwrap().as_ref().map(|p| p.state.clone())
    }

    /// Toggles a primitive on the open panel; `None` when nothing is open.
    pub fn toggle(
        &self,
        primitive: &str,
    ) -> Option<Panel> {
        let mut panel = self.panel.write().unwrap();
        let panel = panel.as_mut()?;
        panel.toggle(primitive);
        Some(panel.clone())
    }

    pub fn clear(&self) {
        *self.panel.write().unwrap() = None;
    }

    /// Clears the panel only if it belongs to `state`.
    pub fn clear_if(
        &self,
        state: &str,
    ) {
        let mut panel = self.panel.write().unwrap();
        if panel.as_ref().is_some_and(|p| p.state == state) {
            *panel = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Panel, Selection};

    #[test]
    fn test_toggle_keeps_check_order() {
        let mut panel = Panel::new("A", vec!["validateOrder".into()]);
        panel.toggle("shipOrder");
        panel.toggle("checkInventory");
        panel.toggle("validateOrder");
        assert_eq!(panel.checked, vec!["shipOrder", "checkInventory"]);
    }

    #[test]
    fn test_single_selection() {
        let selection = Selection::new();
        assert!(selection.toggle("shipOrder").is_none());

        selection.open(Panel::new("A", vec![]));
        selection.open(Panel::new("B", vec![]));
        assert_eq!(selection.selected().as_deref(), Some("B"));

        selection.clear_if("A");
        assert_eq!(selection.selected().as_deref(), Some("B"));
        selection.clear_if("B");
        assert!(selection.current().is_none());
    }
}
