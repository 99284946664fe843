//! Error types for Stateflow.
//!
//! All errors in Stateflow are represented by the `StateflowError` enum.
//! Local validation failures are raised before any store call; store and
//! transport failures are returned to the caller as-is, never retried.

use std::io::ErrorKind as IoErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Stateflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum StateflowError {
    /// A state with this name already exists.
    #[error("state '{0}' already exists")]
    DuplicateName(String),

    /// The state name cannot be used as a store key.
    #[error("invalid state name '{0}'")]
    InvalidName(String),

    /// Unknown endpoint or unsupported handle.
    #[error("{0}")]
    InvalidConnection(String),

    /// Operation on a state that is not known.
    #[error("state '{0}' not found")]
    NotFound(String),

    /// Panel operation without an open panel.
    #[error("no state is selected")]
    NoSelection,

    /// Transport or non-2xx response from the definition store.
    #[error("{0}")]
    StoreUnavailable(String),

    /// Non-JSON or schema-violating payload.
    #[error("{0}")]
    MalformedResponse(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Command queue errors.
    #[error("{0}")]
    Queue(String),
}

/// Discriminant of a [`StateflowError`], for presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    DuplicateName,
    InvalidName,
    InvalidConnection,
    NotFound,
    NoSelection,
    StoreUnavailable,
    MalformedResponse,
    Config,
    IoError,
    Queue,
}

impl StateflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StateflowError::DuplicateName(_) => ErrorKind::DuplicateName,
            StateflowError::InvalidName(_) => ErrorKind::InvalidName,
            StateflowError::InvalidConnection(_) => ErrorKind::InvalidConnection,
            StateflowError::NotFound(_) => ErrorKind::NotFound,
            StateflowError::NoSelection => ErrorKind::NoSelection,
            StateflowError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            StateflowError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            StateflowError::Config(_) => ErrorKind::Config,
            StateflowError::IoError(_) => ErrorKind::IoError,
            StateflowError::Queue(_) => ErrorKind::Queue,
        }
    }

    /// True for errors raised by local validation, before any store call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            StateflowError::DuplicateName(_) | StateflowError::InvalidName(_) | StateflowError::InvalidConnection(_) | StateflowError::NotFound(_) | StateflowError::NoSelection
        )
    }
}

impl From<StateflowError> for String {
    fn from(val: StateflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for StateflowError {
    fn from(error: std::io::Error) -> Self {
        StateflowError::IoError(error.to_string())
    }
}

impl From<StateflowError> for std::io::Error {
    fn from(val: StateflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(IoErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for StateflowError {
    fn from(error: serde_json::Error) -> Self {
        StateflowError::MalformedResponse(error.to_string())
    }
}

impl From<toml::de::Error> for StateflowError {
    fn from(error: toml::de::Error) -> Self {
        StateflowError::Config(error.to_string())
    }
}

impl From<reqwest::Error> for StateflowError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            StateflowError::MalformedResponse(error.to_string())
        } else {
            StateflowError::StoreUnavailable(error.to_string())
        }
    }
}
