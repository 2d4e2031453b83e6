//! Gratitude leaderboard.

use rusqlite::params;
use slab_shared::community::{LeaderboardEntry, LeaderboardQuery, PlayerLevel};

use crate::database::Database;
use crate::error::{Result, StoreError};

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
    let level: String = row.get(4)?;
    let level = level.parse::<PlayerLevel>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let badges: String = row.get(5)?;
    let badges: Vec<String> = serde_json::from_str(&badges).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(LeaderboardEntry {
        id: row.get(0)?,
        player: row.get(1)?,
        points: row.get(2)?,
        rank: row.get(3)?,
        level,
        badges,
    })
}

impl Database {
    /// Players by rank, filtered by level and name.
    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Result<Vec<LeaderboardEntry>> {
        let level = query.level_filter()?;
        let mut stmt = self.conn().prepare(
            "SELECT id, player, points, rank, level, badges FROM leaderboard
             ORDER BY rank ASC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_entry)?;
        let all = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        Ok(all
            .into_iter()
            .filter(|entry| query.matches(level, entry))
            .collect())
    }

    pub fn upsert_player(&self, entry: &LeaderboardEntry) -> Result<()> {
        self.conn().execute(
            "INSERT INTO leaderboard (id, player, points, rank, level, badges)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                player = excluded.player, points = excluded.points, rank = excluded.rank,
                level = excluded.level, badges = excluded.badges",
            params![
                entry.id,
                entry.player,
                entry.points,
                entry.rank,
                entry.level.as_str(),
                serde_json::to_string(&entry.badges)?,
            ],
        )?;
        Ok(())
    }
}
