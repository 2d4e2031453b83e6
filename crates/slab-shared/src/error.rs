use thiserror::Error;

/// A record or form failed validation.  Nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Names of the fields that caused the failure.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::MissingFields(fields) => fields.iter().map(String::as_str).collect(),
            Self::InvalidField { field, .. } => vec![field.as_str()],
        }
    }
}

/// A draft mutation was refused by the entity's field schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field is not editable: {0}")]
    ReadOnlyField(String),

    #[error("Field {field} only accepts one of: {}", .options.join(", "))]
    InvalidChoice {
        field: String,
        options: Vec<String>,
    },

    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Record encoding error: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encoding(e.to_string())
    }
}
