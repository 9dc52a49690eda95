use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a whole poll cycle.
///
/// Any of these leaves the [`TableState`](crate::table::TableState) untouched and becomes the
/// board's "last error" until the next successful poll.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP error: status {0}")]
    Http(u16),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Reasons a response body could not be decoded into a batch of records.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("not an array")]
    NotAnArray,
}

impl FetchError {
    /// Determine if the error originated below HTTP (connection refused, timeout, DNS).
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transport(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// A single record in an otherwise valid batch failed validation.
///
/// Non-fatal: the record is dropped and the rest of the batch is applied.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
#[error(
    "malformed record {}: {}",
    .identity.as_deref().unwrap_or("<unknown>"),
    .reason
)]
pub struct MalformedRecordError {
    pub identity: Option<String>,
    pub reason: String,
}

impl MalformedRecordError {
    pub fn new(identity: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            identity,
            reason: reason.into(),
        }
    }
}

/// Errors produced while loading the board configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read symbol file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse symbol file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid status URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("fixed universe requires at least one tracked identity")]
    EmptyUniverse,
}
