//! Declarative description of one API operation and its input fields.
//!
//! # Design
//! Descriptors are `'static` configuration: they are defined once in
//! `catalog` and only ever borrowed. Each `FieldKind` maps to one entry of a
//! fixed behavior table, so adding a kind means adding a variant and a table
//! row, and the compiler flags every `match` that needs to learn about it.

use serde::Serialize;
use serde_json::Value;

use crate::http::HttpMethod;

/// How a field is presented and, if a handler asks for it, converted.
///
/// The kind is a rendering hint. Form state always stores the raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    ShortText,
    Email,
    Secret,
    Number,
    LongText,
}

/// Per-kind widget and conversion behavior.
#[derive(Debug)]
pub struct FieldBehavior {
    /// Input type name as a browser form would call it.
    pub input_type: &'static str,
    /// Hide the value when echoing it back.
    pub masked: bool,
    /// Accept several lines of input.
    pub multiline: bool,
    pub parse: fn(&str) -> Result<Value, String>,
}

// Indexed by `FieldKind as usize`.
static BEHAVIORS: [FieldBehavior; 5] = [
    FieldBehavior {
        input_type: "text",
        masked: false,
        multiline: false,
        parse: parse_text,
    },
    FieldBehavior {
        input_type: "email",
        masked: false,
        multiline: false,
        parse: parse_text,
    },
    FieldBehavior {
        input_type: "password",
        masked: true,
        multiline: false,
        parse: parse_text,
    },
    FieldBehavior {
        input_type: "number",
        masked: false,
        multiline: false,
        parse: parse_number,
    },
    FieldBehavior {
        input_type: "textarea",
        masked: false,
        multiline: true,
        parse: parse_json,
    },
];

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::ShortText,
        FieldKind::Email,
        FieldKind::Secret,
        FieldKind::Number,
        FieldKind::LongText,
    ];

    pub fn behavior(self) -> &'static FieldBehavior {
        &BEHAVIORS[self as usize]
    }

    /// Converts a raw form value into the JSON value this kind stands for.
    pub fn parse(self, raw: &str) -> Result<Value, String> {
        (self.behavior().parse)(raw)
    }
}

fn parse_text(raw: &str) -> Result<Value, String> {
    Ok(Value::String(raw.to_string()))
}

fn parse_number(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Value::from(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("'{raw}' is not a number"))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    /// Unique within its descriptor; joins form state to the payload.
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub placeholder: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(
        name: &'static str,
        kind: FieldKind,
        label: &'static str,
        placeholder: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            label,
            placeholder: Some(placeholder),
        }
    }
}

/// One operation of the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointDescriptor {
    pub method: HttpMethod,
    /// May contain `{placeholder}` segments.
    pub path: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    /// Display-only; requests are sent with or without a token either way.
    pub requires_auth: bool,
}

impl EndpointDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    /// Names of the `{...}` segments in `path`, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = &'static str> {
        self.path
            .split('/')
            .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
    }

    /// Substitutes placeholders with percent-encoded values.
    ///
    /// Placeholders without a matching entry in `params` are left untouched.
    pub fn render_path(&self, params: &[(&str, &str)]) -> String {
        self.path
            .split('/')
            .map(|segment| {
                let value = segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .and_then(|name| params.iter().find(|(key, _)| *key == name));
                match value {
                    Some((_, value)) => urlencoding::encode(value).into_owned(),
                    None => segment.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn has_unique_field_names(&self) -> bool {
        self.fields
            .iter()
            .enumerate()
            .all(|(i, spec)| self.fields[..i].iter().all(|other| other.name != spec.name))
    }
}
