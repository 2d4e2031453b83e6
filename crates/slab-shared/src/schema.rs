//! Field schemas for published entities.
//!
//! Every entity type declares its editable fields once.  The generic editor
//! uses the schema to accept or refuse draft mutations, and the store-facing
//! save path uses it to enforce required fields before anything is written.

use serde::Serialize;
use serde_json::Value;

use crate::error::{SchemaError, ValidationError};

/// How a field is edited and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    LongText,
    /// Image URL or inline `data:` URI.
    Image,
    /// One of a fixed set of string values.
    Choice(&'static [&'static str]),
    /// Ordered list of strings with dedicated add/remove operations.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: false,
        }
    }

    pub const fn long_text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::LongText,
            required: false,
        }
    }

    pub const fn image(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Image,
            required: false,
        }
    }

    pub const fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Choice(options),
            required: true,
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

pub fn find<'a>(fields: &'a [FieldSpec], name: &str) -> Option<&'a FieldSpec> {
    fields.iter().find(|f| f.name == name)
}

/// Set a scalar field on a serialized record.
///
/// `id` and list fields cannot be set this way; choice fields only accept
/// one of their options.
pub fn apply_update(
    record: &mut Value,
    fields: &[FieldSpec],
    field: &str,
    value: &str,
) -> Result<(), SchemaError> {
    if field == "id" {
        return Err(SchemaError::ReadOnlyField(field.to_string()));
    }
    let spec = find(fields, field).ok_or_else(|| SchemaError::UnknownField(field.to_string()))?;

    match spec.kind {
        FieldKind::List => return Err(SchemaError::ReadOnlyField(field.to_string())),
        FieldKind::Choice(options) if !options.contains(&value) => {
            return Err(SchemaError::InvalidChoice {
                field: field.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
            });
        }
        _ => {}
    }

    let obj = record
        .as_object_mut()
        .ok_or_else(|| SchemaError::Encoding("record is not an object".into()))?;
    obj.insert(field.to_string(), Value::String(value.to_string()));
    Ok(())
}

/// Reject records whose required fields are missing or blank.
pub fn validate_record(record: &Value, fields: &[FieldSpec]) -> Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required)
        .filter(|f| match record.get(f.name) {
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(Value::Array(items)) => items.is_empty(),
            Some(Value::Null) | None => true,
            Some(_) => false,
        })
        .map(|f| f.name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// Check a set of `(field, value)` pairs from an intake form.
pub fn require_non_blank(pairs: &[(&str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<String> = pairs
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

/// Loose `local@domain.tld` shape check, matching what browsers accept for
/// `type="email"` inputs closely enough for intake forms.
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn require_email(field: &str, email: &str) -> Result<(), ValidationError> {
    if looks_like_email(email) {
        Ok(())
    } else {
        Err(ValidationError::invalid(field, "not a valid email address"))
    }
}
