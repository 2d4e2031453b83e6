//! v001 -- Initial schema creation.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Published records, one row per record
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS records (
    collection TEXT    NOT NULL,              -- storage key, e.g. slabCharacters
    id         INTEGER NOT NULL,
    position   INTEGER NOT NULL,              -- display order within collection
    body       TEXT    NOT NULL,              -- JSON record

    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_records_position
    ON records(collection, position);

-- ----------------------------------------------------------------
-- Id allocator, one row per id space
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS id_sequences (
    space   TEXT PRIMARY KEY NOT NULL,
    next_id INTEGER NOT NULL
);

-- ----------------------------------------------------------------
-- Submissions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS submissions (
    kind     TEXT    NOT NULL,                -- story | card | companion
    position INTEGER NOT NULL,                -- index within kind, never reused
    date     TEXT    NOT NULL,                -- RFC-3339
    status   TEXT    NOT NULL,                -- pending | approved | rejected
    body     TEXT    NOT NULL,                -- JSON form fields

    PRIMARY KEY (kind, position)
);

-- ----------------------------------------------------------------
-- Key/value settings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Sessions (tokens are stored as BLAKE3 hashes)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS admin_sessions (
    token_hash TEXT PRIMARY KEY NOT NULL,
    created_at TEXT    NOT NULL,
    expires_at INTEGER NOT NULL               -- unix seconds
);

CREATE TABLE IF NOT EXISTS members (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,              -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS member_sessions (
    token_hash TEXT PRIMARY KEY NOT NULL,
    member_id  INTEGER NOT NULL,
    created_at TEXT    NOT NULL,
    expires_at INTEGER NOT NULL,

    FOREIGN KEY (member_id) REFERENCES members(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Message board
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS board_messages (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    author  TEXT    NOT NULL,
    date    TEXT    NOT NULL,                 -- YYYY-MM-DD
    content TEXT    NOT NULL,
    likes   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS board_replies (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL,
    author     TEXT    NOT NULL,
    date       TEXT    NOT NULL,
    content    TEXT    NOT NULL,

    FOREIGN KEY (message_id) REFERENCES board_messages(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_board_replies_message
    ON board_replies(message_id, id);

-- ----------------------------------------------------------------
-- Donations and leaderboard
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS donations (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    cause        TEXT    NOT NULL,
    character    TEXT,
    amount_cents INTEGER NOT NULL,
    donor_name   TEXT    NOT NULL,
    donor_email  TEXT    NOT NULL,
    message      TEXT    NOT NULL DEFAULT '',
    created_at   TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS leaderboard (
    id     INTEGER PRIMARY KEY NOT NULL,
    player TEXT    NOT NULL,
    points INTEGER NOT NULL,
    rank   INTEGER NOT NULL,
    level  TEXT    NOT NULL,
    badges TEXT    NOT NULL                   -- JSON array of strings
);
"#;

/// Apply the v001 migration.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
