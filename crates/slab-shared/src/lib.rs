//! # slab-shared
//!
//! Domain types for the Slab City Legends content service.
//!
//! Everything here is pure data: published entities and their field schemas,
//! intake forms and the rules that promote an approved submission into a
//! published record, community types (message board, donations,
//! leaderboard), and the validation errors shared by the store and the HTTP
//! layer.  No I/O happens in this crate.

pub mod accounts;
pub mod community;
pub mod constants;
pub mod entities;
pub mod error;
pub mod image;
pub mod notice;
pub mod schema;
pub mod submissions;
pub mod types;

pub use entities::{
    Character, CommunityCard, Companion, Entity, Expansion, Location, Mission, PublishedStory,
};
pub use error::{SchemaError, ValidationError};
pub use notice::Notice;
pub use types::{Collection, EntityKind, RecordId};
