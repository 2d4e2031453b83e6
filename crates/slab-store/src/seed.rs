//! First-run content.
//!
//! A fresh store starts with the stock characters, locations, missions and
//! expansion decks plus the sample leaderboard and message board.  Seeding
//! runs once; the `seeded` setting marks it done so that an admin who
//! empties a collection does not see it refilled on the next start.

use serde::Deserialize;
use serde_json::Value;
use slab_shared::community::{BoardMessage, LeaderboardEntry};
use slab_shared::Collection;

use crate::database::Database;
use crate::error::Result;

const SEED_JSON: &str = include_str!("seed_data.json");
const SEEDED_KEY: &str = "seeded";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedData {
    slab_characters: Vec<Value>,
    slab_locations: Vec<Value>,
    slab_missions: Vec<Value>,
    slab_expansions: Vec<Value>,
    leaderboard: Vec<LeaderboardEntry>,
    messages: Vec<BoardMessage>,
}

impl Database {
    /// Load the stock content if this store has never been seeded.
    /// Returns whether anything was written.
    pub fn seed_defaults(&mut self) -> Result<bool> {
        if self.get_setting(SEEDED_KEY)?.is_some() {
            return Ok(false);
        }
        let data: SeedData = serde_json::from_str(SEED_JSON)?;

        for (collection, values) in [
            (Collection::Characters, &data.slab_characters),
            (Collection::Locations, &data.slab_locations),
            (Collection::Missions, &data.slab_missions),
            (Collection::Expansions, &data.slab_expansions),
        ] {
            // Content already present wins over the stock set.
            if self.collection_len(collection)? == 0 {
                self.write_collection(collection.storage_key(), values)?;
            }
        }
        for entry in &data.leaderboard {
            self.upsert_player(entry)?;
        }
        if self.list_messages(None)?.is_empty() {
            for message in &data.messages {
                self.insert_seed_message(message)?;
            }
        }

        self.set_setting(SEEDED_KEY, &chrono::Utc::now().to_rfc3339())?;
        tracing::info!("default content seeded");
        Ok(true)
    }
}
