use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    Config, Editor, Result, StateflowError, StoreType,
    projection::Placement,
    store::{DefinitionStore, HttpStore, MemStore},
};

/// Assembles an [`Editor`] from a [`Config`] or from explicit parts.
///
/// An explicit store or placement wins over the one the config describes.
#[derive(Default)]
pub struct EditorBuilder {
    config: Config,
    store: Option<Arc<dyn DefinitionStore>>,
    placement: Option<Placement>,
}

impl EditorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn store(
        mut self,
        store: Arc<dyn DefinitionStore>,
    ) -> Self {
        self.store = Some(store);
        self
    }

    pub fn placement(
        mut self,
        placement: Placement,
    ) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn build(self) -> Result<Editor> {
        let store = match self.store {
            Some(store) => store,
            None => Self::build_store(&self.config)?,
        };
        let canvas = &self.config.canvas;
        let placement = self.placement.unwrap_or_else(|| Placement::new(canvas.width, canvas.height, canvas.seed));

        Ok(Editor::with_placement(store, placement))
    }

    fn build_store(config: &Config) -> Result<Arc<dyn DefinitionStore>> {
        match config.store.store_type {
            StoreType::Mem => {
                debug!("using in-memory definition store");
                Ok(Arc::new(MemStore::new()))
            }
            StoreType::Http => {
                let http = config.store.http.as_ref().ok_or_else(|| StateflowError::Config("store_type is http but [store.http] is missing".to_string()))?;
                debug!("using definition store at {}", http.base_url);
                Ok(Arc::new(HttpStore::new(&http.base_url, Duration::from_millis(http.timeout))?))
            }
        }
    }
}
