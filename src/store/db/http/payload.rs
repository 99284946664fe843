//! Response decoding for the definition store REST surface.
//!
//! Older servers answered `GET /api/states` with an array (or `null` when
//! empty) and wrapped upsert answers in `{ "status", "state" }`; both shapes
//! are accepted next to the canonical ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    Result, StateflowError,
    model::{Definitions, StateDefinition},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum StatesPayload {
    Keyed(BTreeMap<String, StateDefinition>),
    Listed(Option<Vec<StateDefinition>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredPayload {
    Envelope { state: StateDefinition },
    Bare(StateDefinition),
}

/// Body of `POST /api/flow`.
#[derive(Serialize)]
pub(crate) struct FlowPayload<'a> {
    pub states: &'a Definitions,
}

pub(crate) fn decode_states(body: &str) -> Result<Definitions> {
    let payload = serde_json::from_str::<StatesPayload>(body).map_err(|e| StateflowError::MalformedResponse(format!("invalid state list: {}", e)))?;

    let defs = match payload {
        StatesPayload::Keyed(map) => map
            .into_iter()
            .map(|(key, def)| {
                if key != def.name {
                    warn!("state stored under '{}' is named '{}'", key, def.name);
                }
                (def.name.clone(), def)
            })
            .collect(),
        StatesPayload::Listed(list) => list.unwrap_or_default().into_iter().map(|def| (def.name.clone(), def)).collect(),
    };

    Ok(defs)
}

pub(crate) fn decode_stored(
    body: &str,
    sent: &StateDefinition,
) -> Result<StateDefinition> {
    let stored = match serde_json::from_str::<StoredPayload>(body).map_err(|e| StateflowError::MalformedResponse(format!("invalid stored state: {}", e)))? {
        StoredPayload::Envelope {
            state,
        } => state,
        StoredPayload::Bare(state) => state,
    };

    if stored.name != sent.name {
        return Err(StateflowError::MalformedResponse(format!("store answered with state '{}' for '{}'", stored.name, sent.name)));
    }
    Ok(stored)
}

pub(crate) fn decode_primitives(body: &str) -> Result<Vec<String>> {
    let primitives = serde_json::from_str::<Option<Vec<String>>>(body).map_err(|e| StateflowError::MalformedResponse(format!("invalid primitive list: {}", e)))?;
    Ok(primitives.unwrap_or_default())
}
