use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a published record.  Unique within an id space (see
/// [`EntityKind::id_space`]) and never reused.
pub type RecordId = i64;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {what}: {value}")]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entity kinds and published collections
// ---------------------------------------------------------------------------

/// The kinds of published record, one per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Character,
    Location,
    Mission,
    Companion,
    Expansion,
    Card,
    Story,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Character,
        EntityKind::Location,
        EntityKind::Mission,
        EntityKind::Companion,
        EntityKind::Expansion,
        EntityKind::Card,
        EntityKind::Story,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Mission => "mission",
            Self::Companion => "companion",
            Self::Expansion => "expansion",
            Self::Card => "card",
            Self::Story => "story",
        }
    }

    /// Ids are allocated per id space.  Companions and spirit guides share
    /// one space so a record can move between the two collections.
    pub fn id_space(&self) -> &'static str {
        self.as_str()
    }

    /// Physical collections holding records of this kind.
    pub fn collections(&self) -> &'static [Collection] {
        match self {
            Self::Character => &[Collection::Characters],
            Self::Location => &[Collection::Locations],
            Self::Mission => &[Collection::Missions],
            Self::Companion => &[Collection::Companions, Collection::SpiritGuides],
            Self::Expansion => &[Collection::Expansions],
            Self::Card => &[Collection::Cards],
            Self::Story => &[Collection::PublishedStories],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("entity kind", s))
    }
}

/// A published collection.  Each one is stored under a well-known key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Characters,
    Companions,
    SpiritGuides,
    Locations,
    Missions,
    Expansions,
    Cards,
    PublishedStories,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Collection::Characters,
        Collection::Companions,
        Collection::SpiritGuides,
        Collection::Locations,
        Collection::Missions,
        Collection::Expansions,
        Collection::Cards,
        Collection::PublishedStories,
    ];

    /// Storage key, also used as the key in backup documents.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Characters => "slabCharacters",
            Self::Companions => "slabCompanions",
            Self::SpiritGuides => "slabSpiritGuides",
            Self::Locations => "slabLocations",
            Self::Missions => "slabMissions",
            Self::Expansions => "slabExpansions",
            Self::Cards => "slabCards",
            Self::PublishedStories => "slabPublishedStories",
        }
    }

    /// URL slug used by the HTTP API.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Characters => "characters",
            Self::Companions => "companions",
            Self::SpiritGuides => "spirit-guides",
            Self::Locations => "locations",
            Self::Missions => "missions",
            Self::Expansions => "expansions",
            Self::Cards => "cards",
            Self::PublishedStories => "published-stories",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.storage_key() == key)
    }

    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Characters => EntityKind::Character,
            Self::Companions | Self::SpiritGuides => EntityKind::Companion,
            Self::Locations => EntityKind::Location,
            Self::Missions => EntityKind::Mission,
            Self::Expansions => EntityKind::Expansion,
            Self::Cards => EntityKind::Card,
            Self::PublishedStories => EntityKind::Story,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Collection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s || c.storage_key() == s)
            .ok_or_else(|| UnknownVariant::new("collection", s))
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionKind {
    Story,
    Card,
    Companion,
}

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 3] = [
        SubmissionKind::Story,
        SubmissionKind::Card,
        SubmissionKind::Companion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::Card => "card",
            Self::Companion => "companion",
        }
    }

    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Story => "slabStorySubmissions",
            Self::Card => "slabCardSubmissions",
            Self::Companion => "slabCompanionSubmissions",
        }
    }

    pub fn from_storage_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.storage_key() == key)
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("submission kind", s))
    }
}

/// Lifecycle of a submission.  Only `Pending -> Approved` and
/// `Pending -> Rejected` exist, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant::new("submission status", other)),
        }
    }
}

/// A moderator's verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn resulting_status(&self) -> SubmissionStatus {
        match self {
            Self::Approve => SubmissionStatus::Approved,
            Self::Reject => SubmissionStatus::Rejected,
        }
    }
}

// ---------------------------------------------------------------------------
// Field enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompanionKind {
    #[default]
    Companion,
    SpiritGuide,
}

impl CompanionKind {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Companion => Collection::Companions,
            Self::SpiritGuide => Collection::SpiritGuides,
        }
    }
}

/// Card categories offered by the card idea form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    Character,
    Companion,
    SpiritGuide,
    Location,
    #[default]
    Item,
    Mission,
    Event,
    Resource,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Companion => "companion",
            Self::SpiritGuide => "spirit-guide",
            Self::Location => "location",
            Self::Item => "item",
            Self::Mission => "mission",
            Self::Event => "event",
            Self::Resource => "resource",
        }
    }
}
