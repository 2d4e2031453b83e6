//! Community pages: message board, donations and the leaderboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_DONATION_CENTS;
use crate::error::ValidationError;
use crate::schema::{require_email, require_non_blank};
use crate::types::UnknownVariant;

// ---------------------------------------------------------------------------
// Message board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardReply {
    pub id: i64,
    pub author: String,
    pub date: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardMessage {
    pub id: i64,
    pub author: String,
    pub date: String,
    pub content: String,
    pub replies: Vec<BoardReply>,
    pub likes: i64,
}

impl BoardMessage {
    /// Case-insensitive match on content or author.  A blank term matches
    /// everything.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.content.to_lowercase().contains(&term)
            || self.author.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub content: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&[("content", &self.content)])
    }
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonationCause {
    #[default]
    Character,
    Locations,
    Game,
}

impl DonationCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Locations => "locations",
            Self::Game => "game",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Character => "Character causes",
            Self::Locations => "Preservation fund",
            Self::Game => "Game development",
        }
    }
}

impl FromStr for DonationCause {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(Self::Character),
            "locations" => Ok(Self::Locations),
            "game" => Ok(Self::Game),
            other => Err(UnknownVariant {
                what: "donation cause",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationForm {
    pub cause: DonationCause,
    /// Character slug, e.g. `builder-bob`.  Required for character causes.
    pub character: Option<String>,
    /// Amount in dollars.
    pub amount: f64,
    pub donor_name: String,
    pub donor_email: String,
    pub message: String,
}

impl DonationForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank(&[
            ("donorName", &self.donor_name),
            ("donorEmail", &self.donor_email),
        ])?;
        require_email("donorEmail", &self.donor_email)?;
        // Checked on the rounded value so nothing below a cent gets through.
        let cents = (self.amount * 100.0).round();
        if !cents.is_finite() || cents < 1.0 {
            return Err(ValidationError::invalid("amount", "must be at least one cent"));
        }
        if cents > MAX_DONATION_CENTS as f64 {
            return Err(ValidationError::invalid("amount", "exceeds the largest accepted donation"));
        }
        if self.cause == DonationCause::Character
            && self.character.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(ValidationError::MissingFields(vec!["character".into()]));
        }
        Ok(())
    }

    pub fn amount_cents(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: i64,
    pub cause: DonationCause,
    pub character: Option<String>,
    pub amount_cents: i64,
    pub donor_name: String,
    pub donor_email: String,
    pub message: String,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerLevel {
    Legend,
    Veteran,
    Regular,
    Newcomer,
}

impl PlayerLevel {
    pub const ALL: [PlayerLevel; 4] = [
        PlayerLevel::Legend,
        PlayerLevel::Veteran,
        PlayerLevel::Regular,
        PlayerLevel::Newcomer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legend => "Legend",
            Self::Veteran => "Veteran",
            Self::Regular => "Regular",
            Self::Newcomer => "Newcomer",
        }
    }
}

impl fmt::Display for PlayerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVariant {
                what: "player level",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub player: String,
    pub points: i64,
    pub rank: i64,
    pub level: PlayerLevel,
    pub badges: Vec<String>,
}

/// Query string for the leaderboard page.  `level` is `all` or one of the
/// level names (any case); `search` is a player-name substring.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LeaderboardQuery {
    pub level: Option<String>,
    pub search: Option<String>,
}

impl LeaderboardQuery {
    pub fn level_filter(&self) -> Result<Option<PlayerLevel>, ValidationError> {
        match self.level.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(l) if l.eq_ignore_ascii_case("all") => Ok(None),
            Some(l) => l
                .parse()
                .map(Some)
                .map_err(|e: UnknownVariant| ValidationError::invalid("level", e.to_string())),
        }
    }

    pub fn matches(&self, level: Option<PlayerLevel>, entry: &LeaderboardEntry) -> bool {
        if level.is_some_and(|l| l != entry.level) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => entry.player.to_lowercase().contains(&term.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(player: &str, level: PlayerLevel) -> LeaderboardEntry {
        LeaderboardEntry {
            id: 1,
            player: player.into(),
            points: 100,
            rank: 1,
            level,
            badges: vec![],
        }
    }

    #[test]
    fn leaderboard_filters_by_level_and_name() {
        let q = LeaderboardQuery {
            level: Some("veteran".into()),
            search: Some("NINJA".into()),
        };
        let level = q.level_filter().unwrap();
        assert_eq!(level, Some(PlayerLevel::Veteran));
        assert!(q.matches(level, &entry("NomadNinja", PlayerLevel::Veteran)));
        assert!(!q.matches(level, &entry("NomadNinja", PlayerLevel::Legend)));
        assert!(!q.matches(level, &entry("DuneRover", PlayerLevel::Veteran)));

        let all = LeaderboardQuery {
            level: Some("all".into()),
            search: None,
        };
        assert_eq!(all.level_filter().unwrap(), None);
        assert!(LeaderboardQuery {
            level: Some("wizard".into()),
            search: None
        }
        .level_filter()
        .is_err());
    }

    #[test]
    fn board_search_covers_author_and_content() {
        let msg = BoardMessage {
            id: 1,
            author: "CactusQueen".into(),
            date: "2025-04-19".into(),
            content: "Best water strategy?".into(),
            replies: vec![],
            likes: 0,
        };
        assert!(msg.matches("cactus"));
        assert!(msg.matches("WATER"));
        assert!(msg.matches(""));
        assert!(!msg.matches("generator"));
    }

    #[test]
    fn donation_rules() {
        let mut form = DonationForm {
            cause: DonationCause::Character,
            character: None,
            amount: 25.0,
            donor_name: "Ann".into(),
            donor_email: "ann@slab.city".into(),
            message: String::new(),
        };
        assert_eq!(form.validate().unwrap_err().fields(), vec!["character"]);

        form.cause = DonationCause::Game;
        assert!(form.validate().is_ok());
        assert_eq!(form.amount_cents(), 2500);

        form.amount = 0.0;
        assert_eq!(form.validate().unwrap_err().fields(), vec!["amount"]);
    }

    #[test]
    fn donation_amount_edges() {
        let mut form = DonationForm {
            cause: DonationCause::Game,
            character: None,
            amount: 0.004,
            donor_name: "Ann".into(),
            donor_email: "ann@slab.city".into(),
            message: String::new(),
        };
        assert_eq!(form.validate().unwrap_err().fields(), vec!["amount"]);

        form.amount = 0.005;
        assert!(form.validate().is_ok());
        assert_eq!(form.amount_cents(), 1);

        form.amount = 1_000_000.0;
        assert!(form.validate().is_ok());
        assert_eq!(form.amount_cents(), MAX_DONATION_CENTS);

        for amount in [1_000_000.01, 1e300, f64::INFINITY, f64::NAN] {
            form.amount = amount;
            assert_eq!(form.validate().unwrap_err().fields(), vec!["amount"]);
        }
    }
}
