//! # slab-store
//!
//! Durable storage for the Slab City Legends content service, backed by
//! SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection`.  Published records are stored one row per record
//! with an explicit position, so saves are per-record upserts rather than
//! whole-collection rewrites.  Approving a submission updates its status and
//! inserts the promoted record in a single transaction.
//!
//! [`EntityEditor`] implements the draft/save state machine shared by every
//! entity type.

pub mod backup;
pub mod board;
pub mod database;
pub mod donations;
pub mod editor;
pub mod leaderboard;
pub mod members;
pub mod migrations;
pub mod records;
pub mod seed;
pub mod sessions;
pub mod submissions;

mod error;
mod ids;

pub use backup::{BackupPayload, ImportStats};
pub use database::Database;
pub use editor::{DeletedRecord, DraftEditor, EditorSuite, EntityEditor, SavedRecord};
pub use error::{Result, StoreError};
pub use records::UpsertOutcome;
pub use sessions::{hash_token, new_session_token, SessionToken};
pub use submissions::Moderation;
