//! REST client for a remote definition store.

mod payload;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use tracing::{trace, warn};

use crate::{
    Result, StateflowError,
    model::{Definitions, StateDefinition},
    store::{DefinitionStore, map_store_err},
};

use payload::*;

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;

/// Definition store reached over `/api/states` and `/api/primitives`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base: Url,
    client: Client,
}

impl HttpStore {
    /// Creates a client for the store rooted at `base_url`, e.g. `http://localhost:8080`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|e| StateflowError::Config(format!("invalid store url '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(StateflowError::Config(format!("invalid store url '{}'", base_url)));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder().default_headers(headers).timeout(timeout).build().map_err(map_store_err)?;

        Ok(Self {
            base,
            client,
        })
    }

    /// Builds `{base}/api/{segments...}`, percent-encoding each segment.
    fn endpoint(
        &self,
        segments: &[&str],
    ) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StateflowError::Config(format!("invalid store url '{}'", self.base)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Reads the body of a 2xx response; anything else is a store failure.
    async fn read_body(response: Response) -> Result<String> {
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await.map_err(map_store_err)?;
        if !status.is_success() {
            warn!("store answered {} for {}", status, url);
            return Err(StateflowError::StoreUnavailable(format!("store answered {} for {}: {}", status, url, body.trim())));
        }
        Ok(body)
    }
}

#[async_trait]
impl DefinitionStore for HttpStore {
    async fn list_states(&self) -> Result<Definitions> {
        let url = self.endpoint(&["states"])?;
        trace!("http::list_states({})", url);
        let response = self.client.get(url).send().await.map_err(map_store_err)?;
        decode_states(&Self::read_body(response).await?)
    }

    async fn upsert_state(
        &self,
        state: &StateDefinition,
    ) -> Result<StateDefinition> {
        let url = self.endpoint(&["states"])?;
        trace!("http::upsert_state({})", state.name);
        let response = self.client.post(url).json(state).send().await.map_err(map_store_err)?;
        decode_stored(&Self::read_body(response).await?, state)
    }

    async fn delete_state(
        &self,
        name: &str,
    ) -> Result<()> {
        let url = self.endpoint(&["states", name])?;
        trace!("http::delete_state({})", name);
        let response = self.client.delete(url).send().await.map_err(map_store_err)?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn save_flow(
        &self,
        states: &Definitions,
    ) -> Result<()> {
        let url = self.endpoint(&["flow"])?;
        trace!("http::save_flow({} states)", states.len());
        let payload = FlowPayload {
            states,
        };
        let response = self.client.post(url).json(&payload).send().await.map_err(map_store_err)?;
        Self::read_body(response).await?;
        Ok(())
    }

    async fn list_primitives(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["primitives"])?;
        trace!("http::list_primitives({})", url);
        let response = self.client.get(url).send().await.map_err(map_store_err)?;
        decode_primitives(&Self::read_body(response).await?)
    }
}
