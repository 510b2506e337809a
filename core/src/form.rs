//! Live input form for one endpoint.
//!
//! # Design
//! A `Form` owns the raw string values typed by the operator, a busy flag
//! and the last `Outcome`. `submit` is single-flight: while one submission is
//! awaiting its request function, further calls return `None` without
//! invoking theirs. The busy flag is reset by a drop guard, so a cancelled
//! submission never leaves the form stuck in the loading state.
//!
//! All methods take `&self`; a form is typically shared as `Arc<Form>` between
//! the code that edits fields and the task awaiting a submission.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::debug;

use crate::endpoint::{EndpointDescriptor, FieldKind, FieldSpec};
use crate::error::ApiError;
use crate::response::{format_outcome, Notifier, Outcome};

const MASK: char = '•';

/// Field name to raw string value. Values are stored verbatim whatever the
/// declared kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    values: HashMap<String, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The value of `name`, or the empty string if it was never set.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Converts the value of `spec` according to its kind.
    pub fn parse_field(&self, spec: &FieldSpec) -> Result<Value, ApiError> {
        spec.kind
            .parse(self.value(spec.name))
            .map_err(|message| ApiError::InputError {
                field: spec.name.to_string(),
                message,
            })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = FormState::new();
        for (name, value) in iter {
            state.set(name, value);
        }
        state
    }
}

/// One field as it should be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub name: &'static str,
    pub label: &'static str,
    pub placeholder: Option<&'static str>,
    pub kind: FieldKind,
    pub input_type: &'static str,
    pub multiline: bool,
    /// Current value, with secrets replaced by mask characters.
    pub display: String,
}

pub struct Form {
    descriptor: &'static EndpointDescriptor,
    state: Mutex<FormState>,
    busy: AtomicBool,
    outcome: Mutex<Option<Outcome>>,
    notifier: Arc<dyn Notifier>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl Form {
    /// A form with no field pre-populated.
    pub fn new(descriptor: &'static EndpointDescriptor, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            descriptor,
            state: Mutex::new(FormState::new()),
            busy: AtomicBool::new(false),
            outcome: Mutex::new(None),
            notifier,
        }
    }

    pub fn descriptor(&self) -> &'static EndpointDescriptor {
        self.descriptor
    }

    /// Stores `value` for a declared field. Any string is accepted.
    pub fn set_field(&self, name: &str, value: impl Into<String>) -> Result<(), ApiError> {
        if self.descriptor.field(name).is_none() {
            return Err(ApiError::UnknownField(name.to_string()));
        }
        lock(&self.state).set(name, value);
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<String> {
        lock(&self.state).get(name).map(str::to_string)
    }

    pub fn snapshot(&self) -> FormState {
        lock(&self.state).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        lock(&self.outcome).clone()
    }

    pub fn render(&self) -> Vec<RenderedField> {
        let state = lock(&self.state);
        self.descriptor
            .fields
            .iter()
            .map(|spec| {
                let behavior = spec.kind.behavior();
                let value = state.value(spec.name);
                let display = if behavior.masked {
                    MASK.to_string().repeat(value.chars().count())
                } else {
                    value.to_string()
                };
                RenderedField {
                    name: spec.name,
                    label: spec.label,
                    placeholder: spec.placeholder,
                    kind: spec.kind,
                    input_type: behavior.input_type,
                    multiline: behavior.multiline,
                    display,
                }
            })
            .collect()
    }

    /// Runs `request` with a snapshot of the current values.
    ///
    /// Returns `None` without calling `request` if a submission is already in
    /// flight. Field values are kept afterwards so the operator can tweak and
    /// resubmit.
    pub async fn submit<F, Fut>(&self, request: F) -> Option<Outcome>
    where
        F: FnOnce(FormState) -> Fut,
        Fut: Future<Output = Result<Value, ApiError>>,
    {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!(path = self.descriptor.path, "submit ignored, request in flight");
            return None;
        }
        let _guard = BusyGuard(&self.busy);
        *lock(&self.outcome) = None;

        let result = request(self.snapshot()).await;
        let outcome = format_outcome(result, self.notifier.as_ref());
        *lock(&self.outcome) = Some(outcome.clone());
        Some(outcome)
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("path", &self.descriptor.path)
            .field("busy", &self.is_busy())
            .finish()
    }
}
