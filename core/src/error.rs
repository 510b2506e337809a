//! Error types for the TrueShift request engine.
//!
//! # Design
//! Every failure a submission can hit collapses into `ApiError`, because the
//! form layer renders all of them the same way: as a single diagnostic string.
//! `HttpError` keeps the parsed server body so `diagnostic` can prefer the
//! server's own message over a generic status line.

use serde_json::Value;

/// Shown when no more specific diagnostic can be extracted.
pub const FALLBACK_DIAGNOSTIC: &str = "Request failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("Request failed with status code {status}")]
    HttpError { status: u16, body: Option<Value> },

    /// The request never produced an HTTP response (DNS, connect, TLS, ...).
    #[error("network error: {0}")]
    NetworkError(String),

    /// A form value could not be converted before dispatch.
    #[error("invalid value for field '{field}': {message}")]
    InputError { field: String, message: String },

    /// The form does not declare a field with this name.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The token could not be persisted or removed from durable storage.
    #[error("token storage failed: {0}")]
    StorageError(String),
}

impl ApiError {
    /// The most specific human-readable explanation available.
    ///
    /// For server errors the body wins: its `message` field, then its
    /// `error` field, then a plain-text body, then the body as compact JSON.
    pub fn diagnostic(&self) -> String {
        match self {
            ApiError::HttpError {
                body: Some(body), ..
            } => server_message(body).unwrap_or_else(|| self.to_string()),
            ApiError::NetworkError(detail) if detail.trim().is_empty() => {
                FALLBACK_DIAGNOSTIC.to_string()
            }
            other => other.to_string(),
        }
    }
}

fn server_message(body: &Value) -> Option<String> {
    match body {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => ["message", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .or_else(|| Some(body.to_string())),
        other => Some(other.to_string()),
    }
}
