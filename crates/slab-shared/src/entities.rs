//! Published entities.
//!
//! Records are flat and serialize with the camelCase field names the web
//! front end already uses (`specialAbility`, `gameEffect`, ...).  Every type
//! implements [`Entity`], which ties it to its [`EntityKind`], its field
//! schema and the placeholder values used by "add new".

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::PLACEHOLDER_IMAGE;
use crate::error::ValidationError;
use crate::schema::{validate_record, FieldSpec};
use crate::types::{CardType, Collection, CompanionKind, Difficulty, EntityKind, RecordId};

/// Behaviour shared by every published record type.
pub trait Entity:
    Serialize + DeserializeOwned + Clone + fmt::Debug + PartialEq + Send + Sync + 'static
{
    const KIND: EntityKind;

    /// Editable fields, in display order.
    fn fields() -> &'static [FieldSpec];

    /// A fresh record for "add new", carrying the tentative id.
    fn scaffold(id: RecordId) -> Self;

    fn id(&self) -> RecordId;

    fn set_id(&mut self, id: RecordId);

    /// Human-readable name used in notices and logs.
    fn label(&self) -> &str;

    /// Collection this record belongs in.  Only companions override this.
    fn collection(&self) -> Collection {
        Self::KIND.collections()[0]
    }

    /// Image slot, for types that carry one.
    fn image_mut(&mut self) -> Option<&mut String> {
        None
    }

    /// Ordered string list stored under `field`, for types that have one.
    fn list_mut(&mut self, _field: &str) -> Option<&mut Vec<String>> {
        None
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let value = serde_json::to_value(self)
            .map_err(|e| ValidationError::invalid("record", e.to_string()))?;
        validate_record(&value, Self::fields())
    }
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Character {
    pub id: RecordId,
    pub name: String,
    pub image: String,
    pub role: String,
    pub description: String,
    pub special_ability: String,
    pub backstory: String,
    pub quotes: Vec<String>,
}

impl Entity for Character {
    const KIND: EntityKind = EntityKind::Character;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name").required(),
            FieldSpec::image("image"),
            FieldSpec::text("role"),
            FieldSpec::long_text("description"),
            FieldSpec::long_text("specialAbility"),
            FieldSpec::long_text("backstory"),
            FieldSpec::list("quotes"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            name: "New Character".into(),
            image: PLACEHOLDER_IMAGE.into(),
            role: "Role Title".into(),
            description: "Character description".into(),
            special_ability: "Special ability description".into(),
            backstory: "Character backstory".into(),
            quotes: vec!["A notable quote".into()],
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image)
    }

    fn list_mut(&mut self, field: &str) -> Option<&mut Vec<String>> {
        (field == "quotes").then_some(&mut self.quotes)
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub id: RecordId,
    pub name: String,
    pub image: String,
    pub description: String,
    pub game_effect: String,
    pub real_world_info: String,
}

impl Entity for Location {
    const KIND: EntityKind = EntityKind::Location;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name").required(),
            FieldSpec::image("image"),
            FieldSpec::long_text("description"),
            FieldSpec::long_text("gameEffect"),
            FieldSpec::long_text("realWorldInfo"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            name: "New Location".into(),
            image: PLACEHOLDER_IMAGE.into(),
            description: "Location description".into(),
            game_effect: "Game effect description".into(),
            real_world_info: "Real-world information about this location".into(),
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image)
    }
}

// ---------------------------------------------------------------------------
// Mission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Mission {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub reward: String,
    pub difficulty: Difficulty,
}

impl Entity for Mission {
    const KIND: EntityKind = EntityKind::Mission;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("title").required(),
            FieldSpec::long_text("description"),
            FieldSpec::long_text("requirements"),
            FieldSpec::long_text("reward"),
            FieldSpec::choice("difficulty", &["Easy", "Medium", "Hard"]),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            title: "New Mission".into(),
            description: "Mission description".into(),
            requirements: "Requirements to complete this mission".into(),
            reward: "Reward for completing this mission".into(),
            difficulty: Difficulty::Medium,
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }
}

// ---------------------------------------------------------------------------
// Companion / spirit guide
// ---------------------------------------------------------------------------

/// A companion or spirit guide.  Both share this type; `kind` decides which
/// physical collection the record lives in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Companion {
    pub id: RecordId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CompanionKind,
    pub description: String,
    pub abilities: String,
    pub backstory: String,
    pub image: String,
}

impl Entity for Companion {
    const KIND: EntityKind = EntityKind::Companion;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name").required(),
            FieldSpec::choice("type", &["companion", "spirit-guide"]),
            FieldSpec::long_text("description"),
            FieldSpec::long_text("abilities"),
            FieldSpec::long_text("backstory"),
            FieldSpec::image("image"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn collection(&self) -> Collection {
        self.kind.collection()
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image)
    }
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// An expansion deck.  Price, card count and release date are free text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Expansion {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub price: String,
    pub card_count: String,
    pub release_date: String,
    pub image: String,
}

impl Entity for Expansion {
    const KIND: EntityKind = EntityKind::Expansion;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name").required(),
            FieldSpec::long_text("description"),
            FieldSpec::text("price"),
            FieldSpec::text("cardCount"),
            FieldSpec::text("releaseDate"),
            FieldSpec::image("image"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image)
    }
}

// ---------------------------------------------------------------------------
// Community card
// ---------------------------------------------------------------------------

/// A community-designed card with no dedicated entity type (items, events,
/// resources).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityCard {
    pub id: RecordId,
    pub name: String,
    pub card_type: CardType,
    pub description: String,
    pub abilities: String,
    pub creator: String,
    pub image: String,
}

impl Entity for CommunityCard {
    const KIND: EntityKind = EntityKind::Card;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("name").required(),
            FieldSpec::choice(
                "cardType",
                &[
                    "character",
                    "companion",
                    "spirit-guide",
                    "location",
                    "item",
                    "mission",
                    "event",
                    "resource",
                ],
            ),
            FieldSpec::long_text("description"),
            FieldSpec::long_text("abilities"),
            FieldSpec::text("creator"),
            FieldSpec::image("image"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn image_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.image)
    }
}

// ---------------------------------------------------------------------------
// Published story
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishedStory {
    pub id: RecordId,
    pub title: String,
    pub author: String,
    pub story: String,
    /// Date the story was originally submitted (RFC 3339).
    pub date: String,
}

impl Entity for PublishedStory {
    const KIND: EntityKind = EntityKind::Story;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("title").required(),
            FieldSpec::text("author").required(),
            FieldSpec::long_text("story").required(),
            FieldSpec::text("date"),
        ];
        FIELDS
    }

    fn scaffold(id: RecordId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.title
    }
}
