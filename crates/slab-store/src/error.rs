use slab_shared::{EntityKind, SchemaError, ValidationError};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored row could not be decoded.
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An editor operation needs a draft but the editor is idle.
    #[error("No {0} is being edited")]
    NotEditing(EntityKind),

    #[error("{kind} has no list field named {field}")]
    NoSuchList { kind: EntityKind, field: String },

    #[error("{kind} records have no image")]
    NoImage { kind: EntityKind },

    #[error("Unknown collection key: {0}")]
    UnknownCollection(String),

    /// Unique constraint on a member account.
    #[error("{0} is already taken")]
    Taken(&'static str),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}
