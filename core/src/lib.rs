//! Request-dispatch engine for the TrueShift API tester.
//!
//! # Overview
//! Turns a declarative endpoint description into a live form, dispatches the
//! submitted values through a shared HTTP client that carries the session's
//! bearer token, and normalizes the result into a single renderable outcome.
//!
//! # Design
//! - `Session` owns the one bearer token and its durable copy; it is passed
//!   explicitly to `ApiClient::new` instead of living in a global.
//! - `ApiClient` splits every call into `build_request` and `parse_response`
//!   around a pluggable `Transport`, so request shaping is testable offline.
//! - `EndpointDescriptor` and `FieldKind` are static data; `Form` stores raw
//!   strings and leaves conversion to the per-endpoint handlers.
//! - `Form::submit` is single-flight per form and always ends in exactly one
//!   `Outcome`.

pub mod catalog;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod form;
pub mod handlers;
pub mod http;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use catalog::{EndpointId, Section};
pub use client::ApiClient;
pub use endpoint::{EndpointDescriptor, FieldBehavior, FieldKind, FieldSpec};
pub use error::ApiError;
pub use form::{Form, FormState, RenderedField};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{format_outcome, Notification, NotificationLevel, Notifier, Outcome, TracingNotifier};
pub use session::{FileTokenStorage, MemoryTokenStorage, Session, TokenStorage};
pub use transport::{Transport, UreqTransport};
