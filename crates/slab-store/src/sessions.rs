//! Bearer-token sessions.
//!
//! Tokens are random 32-byte values handed to the client in hex.  Only
//! their BLAKE3 hash is stored, alongside an expiry in unix seconds.  An
//! admin session row is what keeps the admin gate open across restarts.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusqlite::{params, OptionalExtension};
use slab_shared::constants::SESSION_TOKEN_BYTES;

use crate::database::Database;
use crate::error::Result;

/// A freshly issued session.  `token` is shown to the client once.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a random hex token.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

impl Database {
    pub fn create_admin_session(&self, ttl_secs: i64) -> Result<SessionToken> {
        let token = new_session_token();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs);
        self.conn().execute(
            "INSERT INTO admin_sessions (token_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3)",
            params![hash_token(&token), now.to_rfc3339(), expires_at.timestamp()],
        )?;
        tracing::info!(expires_at = %expires_at, "admin session opened");
        Ok(SessionToken { token, expires_at })
    }

    /// Whether `token` names a live admin session.
    pub fn admin_session_valid(&self, token: &str) -> Result<bool> {
        let hit = self
            .conn()
            .query_row(
                "SELECT 1 FROM admin_sessions WHERE token_hash = ?1 AND expires_at > ?2",
                params![hash_token(token), Utc::now().timestamp()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    pub fn end_admin_session(&self, token: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM admin_sessions WHERE token_hash = ?1",
            params![hash_token(token)],
        )?;
        Ok(affected > 0)
    }

    /// Drop expired admin and member sessions.  Returns the number removed.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let now = Utc::now().timestamp();
        let admin = self.conn().execute(
            "DELETE FROM admin_sessions WHERE expires_at <= ?1",
            params![now],
        )?;
        let member = self.conn().execute(
            "DELETE FROM member_sessions WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(admin + member)
    }
}
