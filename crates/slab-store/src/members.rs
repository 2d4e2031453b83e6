//! Member accounts and member sessions.
//!
//! Passwords are stored as Argon2id PHC strings.  Emails and usernames are
//! unique regardless of case.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension};
use slab_shared::accounts::{LoginForm, Member, RegisterForm};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::sessions::{hash_token, new_session_token, SessionToken};

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(StoreError::PasswordHash(e.to_string())),
    }
}

fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    pub fn register_member(&self, form: &RegisterForm) -> Result<Member> {
        form.validate()?;
        let email = form.email.trim();
        let username = form.username.trim();

        let taken = |sql: &str, value: &str| -> Result<bool> {
            Ok(self
                .conn()
                .query_row(sql, params![value], |_| Ok(()))
                .optional()?
                .is_some())
        };
        if taken("SELECT 1 FROM members WHERE email = ?1", email)? {
            return Err(StoreError::Taken("email"));
        }
        if taken("SELECT 1 FROM members WHERE username = ?1", username)? {
            return Err(StoreError::Taken("username"));
        }

        let created_at = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT INTO members (email, username, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![email, username, hash_password(&form.password)?, created_at],
        )?;
        let id = self.conn().last_insert_rowid();

        tracing::info!(member_id = id, username, "member registered");
        Ok(Member {
            id,
            email: email.to_string(),
            username: username.to_string(),
            created_at,
        })
    }

    /// Check a login (email or username) and password.
    pub fn verify_member(&self, form: &LoginForm) -> Result<Member> {
        form.validate()?;
        let login = form.login.trim();
        let sql = if login.contains('@') {
            "SELECT id, email, username, created_at, password_hash FROM members WHERE email = ?1"
        } else {
            "SELECT id, email, username, created_at, password_hash FROM members WHERE username = ?1"
        };
        let found = self
            .conn()
            .query_row(
                sql,
                params![login],
                |row| Ok((row_to_member(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;

        match found {
            Some((member, hash)) if verify_password(&form.password, &hash)? => Ok(member),
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    pub fn create_member_session(&self, member_id: i64, ttl_secs: i64) -> Result<SessionToken> {
        let token = new_session_token();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs);
        self.conn().execute(
            "INSERT INTO member_sessions (token_hash, member_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                hash_token(&token),
                member_id,
                now.to_rfc3339(),
                expires_at.timestamp()
            ],
        )?;
        Ok(SessionToken { token, expires_at })
    }

    /// Member owning a live session, if any.
    pub fn member_for_session(&self, token: &str) -> Result<Option<Member>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT m.id, m.email, m.username, m.created_at
                 FROM member_sessions s JOIN members m ON m.id = s.member_id
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2",
                params![hash_token(token), Utc::now().timestamp()],
                row_to_member,
            )
            .optional()?)
    }

    pub fn end_member_session(&self, token: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM member_sessions WHERE token_hash = ?1",
            params![hash_token(token)],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(db: &Database, email: &str, username: &str) -> Result<Member> {
        db.register_member(&RegisterForm {
            email: email.into(),
            username: username.into(),
            password: "desert-rat".into(),
            confirm_password: "desert-rat".into(),
        })
    }

    #[test]
    fn password_hash_is_argon2id() {
        let hash = hash_password("desert-rat").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("desert-rat", &hash).unwrap());
        assert!(!verify_password("oasis", &hash).unwrap());
    }

    #[test]
    fn register_then_login_by_email_or_username() {
        let db = Database::open_in_memory().unwrap();
        let member = register(&db, "ann@slab.city", "ann").unwrap();

        for login in ["ann@slab.city", "ANN"] {
            let found = db
                .verify_member(&LoginForm {
                    login: login.into(),
                    password: "desert-rat".into(),
                })
                .unwrap();
            assert_eq!(found, member);
        }

        assert!(matches!(
            db.verify_member(&LoginForm {
                login: "ann".into(),
                password: "wrong".into(),
            }),
            Err(StoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicates_are_refused() {
        let db = Database::open_in_memory().unwrap();
        register(&db, "ann@slab.city", "ann").unwrap();
        assert!(matches!(
            register(&db, "ANN@slab.city", "other"),
            Err(StoreError::Taken("email"))
        ));
        assert!(matches!(
            register(&db, "new@slab.city", "Ann"),
            Err(StoreError::Taken("username"))
        ));
    }

    #[test]
    fn email_shaped_usernames_are_refused() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            register(&db, "squat@slab.city", "ann@slab.city"),
            Err(StoreError::Validation(_))
        ));

        let ann = register(&db, "ann@slab.city", "ann").unwrap();
        let found = db
            .verify_member(&LoginForm {
                login: "ann@slab.city".into(),
                password: "desert-rat".into(),
            })
            .unwrap();
        assert_eq!(found, ann);
    }

    #[test]
    fn member_sessions_resolve_and_end() {
        let db = Database::open_in_memory().unwrap();
        let member = register(&db, "tim@slab.city", "tim").unwrap();
        let session = db.create_member_session(member.id, 60).unwrap();

        assert_eq!(db.member_for_session(&session.token).unwrap(), Some(member));
        assert!(db.end_member_session(&session.token).unwrap());
        assert_eq!(db.member_for_session(&session.token).unwrap(), None);
    }
}
