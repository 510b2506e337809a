//! Turns the result of a submission into the one thing the operator sees.
//!
//! # Design
//! Success and failure collapse into `Outcome`, which always renders as
//! pretty-printed JSON: the payload itself, or `{"error": <diagnostic>}`.
//! Each formatted outcome also raises one transient `Notification`.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ApiError;

pub const SUCCESS_NOTICE: &str = "Request successful!";
pub const FAILURE_NOTICE: &str = "Request failed";

/// Result of one submission. Never merged with a previous one.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The structural form shown to the operator.
    pub fn to_value(&self) -> Value {
        match self {
            Outcome::Success(payload) => payload.clone(),
            Outcome::Failure(message) => json!({ "error": message }),
        }
    }

    pub fn render(&self) -> String {
        let value = self.to_value();
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Failure,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Failure,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}

/// Receives transient user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sends notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Failure => warn!("{}", notification.message),
            _ => info!("{}", notification.message),
        }
    }
}

/// Converts a request result into an `Outcome` and raises the matching notice.
pub fn format_outcome(result: Result<Value, ApiError>, notifier: &dyn Notifier) -> Outcome {
    match result {
        Ok(payload) => {
            notifier.notify(Notification::success(SUCCESS_NOTICE));
            Outcome::Success(payload)
        }
        Err(err) => {
            notifier.notify(Notification::failure(FAILURE_NOTICE));
            Outcome::Failure(err.diagnostic())
        }
    }
}
