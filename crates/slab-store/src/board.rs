//! Community message board.

use chrono::Utc;
use rusqlite::{params, Connection};
use slab_shared::community::{BoardMessage, BoardReply, PostForm};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn replies_for(conn: &Connection, message_id: i64) -> Result<Vec<BoardReply>> {
    let mut stmt = conn.prepare(
        "SELECT id, author, date, content FROM board_replies
         WHERE message_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![message_id], |row| {
        Ok(BoardReply {
            id: row.get(0)?,
            author: row.get(1)?,
            date: row.get(2)?,
            content: row.get(3)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StoreError::Sqlite)
}

impl Database {
    /// Threads newest first, each with its replies in posting order.  A
    /// non-blank `search` keeps threads whose author or content contains it,
    /// ignoring case.
    pub fn list_messages(&self, search: Option<&str>) -> Result<Vec<BoardMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, author, date, content, likes FROM board_messages
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(BoardMessage {
                id: row.get(0)?,
                author: row.get(1)?,
                date: row.get(2)?,
                content: row.get(3)?,
                replies: Vec::new(),
                likes: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for message in rows {
            let mut message = message?;
            if !message.matches(search.unwrap_or_default()) {
                continue;
            }
            message.replies = replies_for(self.conn(), message.id)?;
            out.push(message);
        }
        Ok(out)
    }

    pub fn get_message(&self, id: i64) -> Result<BoardMessage> {
        let mut message = self
            .conn()
            .query_row(
                "SELECT id, author, date, content, likes FROM board_messages WHERE id = ?1",
                params![id],
                |row| {
                    Ok(BoardMessage {
                        id: row.get(0)?,
                        author: row.get(1)?,
                        date: row.get(2)?,
                        content: row.get(3)?,
                        replies: Vec::new(),
                        likes: row.get(4)?,
                    })
                },
            )
            .map_err(not_found)?;
        message.replies = replies_for(self.conn(), id)?;
        Ok(message)
    }

    pub fn post_message(&self, author: &str, form: &PostForm) -> Result<BoardMessage> {
        form.validate()?;
        let date = today();
        let content = form.content.trim();
        self.conn().execute(
            "INSERT INTO board_messages (author, date, content, likes) VALUES (?1, ?2, ?3, 0)",
            params![author, date, content],
        )?;
        let id = self.conn().last_insert_rowid();
        tracing::info!(message_id = id, author, "board message posted");

        Ok(BoardMessage {
            id,
            author: author.to_string(),
            date,
            content: content.to_string(),
            replies: Vec::new(),
            likes: 0,
        })
    }

    pub fn reply_to_message(
        &self,
        message_id: i64,
        author: &str,
        form: &PostForm,
    ) -> Result<BoardReply> {
        form.validate()?;
        // Surfaces NotFound for a missing thread before the FK does.
        self.get_message(message_id)?;

        let date = today();
        let content = form.content.trim();
        self.conn().execute(
            "INSERT INTO board_replies (message_id, author, date, content)
             VALUES (?1, ?2, ?3, ?4)",
            params![message_id, author, date, content],
        )?;
        Ok(BoardReply {
            id: self.conn().last_insert_rowid(),
            author: author.to_string(),
            date,
            content: content.to_string(),
        })
    }

    /// Add one like.  Returns the new count.
    pub fn like_message(&self, message_id: i64) -> Result<i64> {
        self.conn()
            .query_row(
                "UPDATE board_messages SET likes = likes + 1 WHERE id = ?1 RETURNING likes",
                params![message_id],
                |row| row.get(0),
            )
            .map_err(not_found)
    }

    pub(crate) fn insert_seed_message(&self, message: &BoardMessage) -> Result<()> {
        self.conn().execute(
            "INSERT INTO board_messages (id, author, date, content, likes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id,
                message.author,
                message.date,
                message.content,
                message.likes
            ],
        )?;
        for reply in &message.replies {
            self.conn().execute(
                "INSERT INTO board_replies (id, message_id, author, date, content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![reply.id, message.id, reply.author, reply.date, reply.content],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content: &str) -> PostForm {
        PostForm {
            content: content.into(),
        }
    }

    #[test]
    fn threads_are_newest_first_with_replies() {
        let db = Database::open_in_memory().unwrap();
        let first = db.post_message("ann", &post("Water tips?")).unwrap();
        let second = db.post_message("tim", &post("Tournament at The Range")).unwrap();
        db.reply_to_message(first.id, "tim", &post("Bring jugs")).unwrap();

        let all = db.list_messages(None).unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].replies.len(), 1);
        assert_eq!(all[1].replies[0].content, "Bring jugs");

        let found = db.list_messages(Some("range")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].author, "tim");
    }

    #[test]
    fn likes_and_missing_threads() {
        let db = Database::open_in_memory().unwrap();
        let m = db.post_message("ann", &post("hello")).unwrap();
        assert_eq!(db.like_message(m.id).unwrap(), 1);
        assert_eq!(db.like_message(m.id).unwrap(), 2);
        assert!(matches!(db.like_message(999), Err(StoreError::NotFound)));
        assert!(matches!(
            db.reply_to_message(999, "ann", &post("hi")),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn blank_posts_are_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.post_message("ann", &post("   ")),
            Err(StoreError::Validation(_))
        ));
        assert!(db.list_messages(None).unwrap().is_empty());
    }
}
