//! User submissions and their promotion into published records.
//!
//! A visitor fills one of three intake forms.  The store keeps the form
//! body together with a date and a [`SubmissionStatus`].  When a moderator
//! approves a submission, [`SubmissionForm::promote`] builds the published
//! record that goes into the matching collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::COMMUNITY_ROLE;
use crate::entities::{
    Character, CommunityCard, Companion, Entity, Location, Mission, PublishedStory,
};
use crate::error::ValidationError;
use crate::schema::{require_email, require_non_blank};
use crate::types::{
    CardType, Collection, CompanionKind, Difficulty, SubmissionKind, SubmissionStatus,
};

// ---------------------------------------------------------------------------
// Intake forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryForm {
    pub title: String,
    pub author: String,
    pub email: String,
    pub story: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardForm {
    pub card_name: String,
    pub card_type: CardType,
    pub description: String,
    pub abilities: String,
    pub creator: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanionForm {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CompanionKind,
    pub description: String,
    pub abilities: String,
    pub backstory: String,
    pub creator: String,
    pub email: String,
}

/// One of the three intake forms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SubmissionForm {
    Story(StoryForm),
    Card(CardForm),
    Companion(CompanionForm),
}

impl SubmissionForm {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Self::Story(_) => SubmissionKind::Story,
            Self::Card(_) => SubmissionKind::Card,
            Self::Companion(_) => SubmissionKind::Companion,
        }
    }

    /// Title shown in moderation lists.
    pub fn title(&self) -> &str {
        match self {
            Self::Story(f) => &f.title,
            Self::Card(f) => &f.card_name,
            Self::Companion(f) => &f.name,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Story(f) => {
                require_non_blank(&[
                    ("title", &f.title),
                    ("author", &f.author),
                    ("email", &f.email),
                    ("story", &f.story),
                ])?;
                require_email("email", &f.email)
            }
            Self::Card(f) => {
                require_non_blank(&[
                    ("cardName", &f.card_name),
                    ("description", &f.description),
                    ("abilities", &f.abilities),
                    ("creator", &f.creator),
                    ("email", &f.email),
                ])?;
                require_email("email", &f.email)
            }
            Self::Companion(f) => {
                require_non_blank(&[
                    ("name", &f.name),
                    ("description", &f.description),
                    ("abilities", &f.abilities),
                    ("creator", &f.creator),
                    ("email", &f.email),
                ])?;
                require_email("email", &f.email)
            }
        }
    }

    /// Serialize the form fields alone, without the `kind` tag.
    pub fn to_body(&self) -> serde_json::Result<Value> {
        match self {
            Self::Story(f) => serde_json::to_value(f),
            Self::Card(f) => serde_json::to_value(f),
            Self::Companion(f) => serde_json::to_value(f),
        }
    }

    pub fn from_body(kind: SubmissionKind, body: Value) -> serde_json::Result<Self> {
        Ok(match kind {
            SubmissionKind::Story => Self::Story(serde_json::from_value(body)?),
            SubmissionKind::Card => Self::Card(serde_json::from_value(body)?),
            SubmissionKind::Companion => Self::Companion(serde_json::from_value(body)?),
        })
    }

    /// Build the published record for an approved submission.  The id is a
    /// placeholder; the store assigns the real one on insert.
    pub fn promote(&self, submitted_at: DateTime<Utc>) -> Promotion {
        match self {
            Self::Story(f) => Promotion::Story(PublishedStory {
                id: 0,
                title: f.title.clone(),
                author: f.author.clone(),
                story: f.story.clone(),
                date: submitted_at.to_rfc3339(),
            }),
            Self::Card(f) => promote_card(f),
            Self::Companion(f) => Promotion::Companion(Companion {
                id: 0,
                name: f.name.clone(),
                kind: f.kind,
                description: f.description.clone(),
                abilities: f.abilities.clone(),
                backstory: f.backstory.clone(),
                image: String::new(),
            }),
        }
    }
}

/// Card ideas route by their own `cardType`.
fn promote_card(f: &CardForm) -> Promotion {
    match f.card_type {
        CardType::Character => Promotion::Character(Character {
            id: 0,
            name: f.card_name.clone(),
            image: String::new(),
            role: COMMUNITY_ROLE.to_string(),
            description: f.description.clone(),
            special_ability: f.abilities.clone(),
            backstory: format!("Created by {}", f.creator),
            quotes: Vec::new(),
        }),
        CardType::Companion | CardType::SpiritGuide => Promotion::Companion(Companion {
            id: 0,
            name: f.card_name.clone(),
            kind: if f.card_type == CardType::SpiritGuide {
                CompanionKind::SpiritGuide
            } else {
                CompanionKind::Companion
            },
            description: f.description.clone(),
            abilities: f.abilities.clone(),
            backstory: format!("Created by {}", f.creator),
            image: String::new(),
        }),
        CardType::Location => Promotion::Location(Location {
            id: 0,
            name: f.card_name.clone(),
            image: String::new(),
            description: f.description.clone(),
            game_effect: f.abilities.clone(),
            real_world_info: String::new(),
        }),
        CardType::Mission => Promotion::Mission(Mission {
            id: 0,
            title: f.card_name.clone(),
            description: f.description.clone(),
            requirements: f.abilities.clone(),
            reward: String::new(),
            difficulty: Difficulty::Medium,
        }),
        CardType::Item | CardType::Event | CardType::Resource => {
            Promotion::Card(CommunityCard {
                id: 0,
                name: f.card_name.clone(),
                card_type: f.card_type,
                description: f.description.clone(),
                abilities: f.abilities.clone(),
                creator: f.creator.clone(),
                image: String::new(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Stored submission
// ---------------------------------------------------------------------------

/// A submission as stored.  `index` is its position within its kind's
/// collection and is the handle moderators act on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub index: usize,
    pub date: DateTime<Utc>,
    pub status: SubmissionStatus,
    #[serde(flatten)]
    pub form: SubmissionForm,
}

impl Submission {
    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

// ---------------------------------------------------------------------------
// Promotion
// ---------------------------------------------------------------------------

/// The published record produced by approving a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    Story(PublishedStory),
    Character(Character),
    Location(Location),
    Mission(Mission),
    Companion(Companion),
    Card(CommunityCard),
}

impl Promotion {
    pub fn collection(&self) -> Collection {
        match self {
            Self::Story(r) => r.collection(),
            Self::Character(r) => r.collection(),
            Self::Location(r) => r.collection(),
            Self::Mission(r) => r.collection(),
            Self::Companion(r) => r.collection(),
            Self::Card(r) => r.collection(),
        }
    }
}
