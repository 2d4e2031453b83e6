//! Published records.
//!
//! Each record is one row in `records`, keyed by `(collection, id)`, with a
//! `position` that preserves display order.  Updates rewrite the row in
//! place; inserts append at the end of the collection.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use slab_shared::types::SubmissionKind;
use slab_shared::{
    Character, Collection, CommunityCard, Companion, Entity, EntityKind, Expansion, Location,
    Mission, PublishedStory, RecordId,
};

use crate::database::Database;
use crate::error::{not_found, Result, StoreError};
use crate::ids::allocate_id;

/// What a save did to the published collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// The record changed physical collection (companion type switch).
    Moved { from: Collection },
}

impl Database {
    /// Records of one physical collection, in display order.  Rows that no
    /// longer deserialize are skipped with a warning.
    pub fn list_collection<E: Entity>(&self, collection: Collection) -> Result<Vec<E>> {
        let mut out = Vec::new();
        for (id, body) in load_bodies(self.conn(), collection)? {
            match serde_json::from_str::<E>(&body) {
                Ok(mut record) => {
                    record.set_id(id);
                    out.push(record);
                }
                Err(e) => {
                    tracing::warn!(collection = %collection, id, error = %e, "skipping malformed record");
                }
            }
        }
        Ok(out)
    }

    /// All records of `E`'s kind, across its physical collections.
    pub fn list_records<E: Entity>(&self) -> Result<Vec<E>> {
        let mut out = Vec::new();
        for collection in E::KIND.collections() {
            out.extend(self.list_collection::<E>(*collection)?);
        }
        Ok(out)
    }

    pub fn get_record<E: Entity>(&self, id: RecordId) -> Result<E> {
        let collection = find_collection(self.conn(), E::KIND, id)?.ok_or(StoreError::NotFound)?;
        let body = load_body(self.conn(), collection, id)?;
        let mut record: E = serde_json::from_str(&body)?;
        record.set_id(id);
        Ok(record)
    }

    /// Validate and write one record.  An existing id is replaced in place;
    /// an unknown id is appended.
    pub fn upsert_record<E: Entity>(&mut self, record: &E) -> Result<UpsertOutcome> {
        record.validate()?;
        let tx = self.conn_mut().transaction()?;
        let outcome = store_record(&tx, record)?;
        tx.commit()?;

        tracing::info!(
            collection = %record.collection(),
            id = record.id(),
            ?outcome,
            "record saved"
        );
        Ok(outcome)
    }

    /// Validate a new record, give it a fresh id and append it.
    pub fn insert_record<E: Entity>(&mut self, record: E) -> Result<E> {
        let tx = self.conn_mut().transaction()?;
        let record = insert_new(&tx, record)?;
        tx.commit()?;
        Ok(record)
    }

    /// Remove a record by id from whichever collection of `kind` holds it.
    pub fn delete_record(&self, kind: EntityKind, id: RecordId) -> Result<bool> {
        let mut affected = 0;
        for collection in kind.collections() {
            affected += self.conn().execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![collection.storage_key(), id],
            )?;
        }
        if affected > 0 {
            tracing::info!(kind = %kind, id, "record deleted");
        }
        Ok(affected > 0)
    }

    pub fn collection_len(&self, collection: Collection) -> Result<usize> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![collection.storage_key()],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    /// Raw JSON records of one collection, in display order.
    pub fn list_values(&self, collection: Collection) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        for (id, body) in load_bodies(self.conn(), collection)? {
            match serde_json::from_str::<Value>(&body) {
                Ok(value) if value.is_object() => out.push(value),
                Ok(_) => {
                    tracing::warn!(collection = %collection, id, "skipping non-object record");
                }
                Err(e) => {
                    tracing::warn!(collection = %collection, id, error = %e, "skipping malformed record");
                }
            }
        }
        Ok(out)
    }

    pub fn get_value(&self, collection: Collection, id: RecordId) -> Result<Value> {
        let body = load_body(self.conn(), collection, id)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Read a whole collection by storage key.  Unknown keys read as empty.
    pub fn read_collection(&self, key: &str) -> Result<Vec<Value>> {
        if let Some(collection) = Collection::from_storage_key(key) {
            return self.list_values(collection);
        }
        if let Some(kind) = SubmissionKind::from_storage_key(key) {
            return self.submission_values(kind);
        }
        tracing::debug!(key, "read of unknown collection key");
        Ok(Vec::new())
    }

    /// Replace a whole collection by storage key, in one transaction.
    /// Entries that do not parse as the collection's record type are
    /// skipped with a warning.  Returns the number of entries written.
    pub fn write_collection(&mut self, key: &str, values: &[Value]) -> Result<usize> {
        let tx = self.conn_mut().transaction()?;
        let written = replace_collection(&tx, key, values)?;
        tx.commit()?;
        Ok(written)
    }
}

/// Full replace of one collection by storage key, on the caller's
/// connection or transaction.
pub(crate) fn replace_collection(conn: &Connection, key: &str, values: &[Value]) -> Result<usize> {
    let written = if let Some(collection) = Collection::from_storage_key(key) {
        replace_records(conn, collection, values)?
    } else if let Some(kind) = SubmissionKind::from_storage_key(key) {
        crate::submissions::replace_submissions(conn, kind, values)?
    } else {
        return Err(StoreError::UnknownCollection(key.to_string()));
    };

    tracing::info!(key, written, skipped = values.len() - written, "collection replaced");
    Ok(written)
}

// ---------------------------------------------------------------------------
// Connection-level helpers, usable inside a transaction
// ---------------------------------------------------------------------------

fn load_bodies(conn: &Connection, collection: Collection) -> Result<Vec<(RecordId, String)>> {
    let mut stmt = conn.prepare(
        "SELECT id, body FROM records WHERE collection = ?1 ORDER BY position ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![collection.storage_key()], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(StoreError::Sqlite)
}

fn load_body(conn: &Connection, collection: Collection, id: RecordId) -> Result<String> {
    conn.query_row(
        "SELECT body FROM records WHERE collection = ?1 AND id = ?2",
        params![collection.storage_key(), id],
        |row| row.get(0),
    )
    .map_err(not_found)
}

pub(crate) fn find_collection(
    conn: &Connection,
    kind: EntityKind,
    id: RecordId,
) -> Result<Option<Collection>> {
    for collection in kind.collections() {
        let hit = conn
            .query_row(
                "SELECT 1 FROM records WHERE collection = ?1 AND id = ?2",
                params![collection.storage_key(), id],
                |_| Ok(()),
            )
            .optional()?;
        if hit.is_some() {
            return Ok(Some(*collection));
        }
    }
    Ok(None)
}

fn append_body(conn: &Connection, collection: Collection, id: RecordId, body: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO records (collection, id, position, body)
         VALUES (?1, ?2,
                 (SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE collection = ?1),
                 ?3)",
        params![collection.storage_key(), id, body],
    )?;
    Ok(())
}

/// Upsert without validation or logging; callers own both.
fn store_record<E: Entity>(conn: &Connection, record: &E) -> Result<UpsertOutcome> {
    let target = record.collection();
    let body = serde_json::to_string(record)?;

    match find_collection(conn, E::KIND, record.id())? {
        Some(current) if current == target => {
            conn.execute(
                "UPDATE records SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![target.storage_key(), record.id(), body],
            )?;
            Ok(UpsertOutcome::Updated)
        }
        Some(current) => {
            conn.execute(
                "DELETE FROM records WHERE collection = ?1 AND id = ?2",
                params![current.storage_key(), record.id()],
            )?;
            append_body(conn, target, record.id(), &body)?;
            Ok(UpsertOutcome::Moved { from: current })
        }
        None => {
            append_body(conn, target, record.id(), &body)?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

pub(crate) fn insert_new<E: Entity>(conn: &Connection, mut record: E) -> Result<E> {
    record.validate()?;
    record.set_id(allocate_id(conn, E::KIND)?);
    let body = serde_json::to_string(&record)?;
    append_body(conn, record.collection(), record.id(), &body)?;

    tracing::info!(collection = %record.collection(), id = record.id(), "record inserted");
    Ok(record)
}

/// Parse an imported entry as `E` and re-serialize it, so only well-formed
/// records reach the table.
fn normalize<E: Entity>(collection: Collection, value: &Value) -> Option<(RecordId, String)> {
    let mut value = value.clone();
    if let Some(obj) = value.as_object_mut() {
        coerce_id(collection, obj);
    }
    // The physical collection decides a companion's type.
    if let (Some(obj), Collection::Companions | Collection::SpiritGuides) =
        (value.as_object_mut(), collection)
    {
        let kind = if collection == Collection::SpiritGuides {
            "spirit-guide"
        } else {
            "companion"
        };
        obj.insert("type".into(), Value::String(kind.into()));
    }

    match serde_json::from_value::<E>(value) {
        Ok(record) => match serde_json::to_string(&record) {
            Ok(body) => Some((record.id(), body)),
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "skipping unserializable entry");
                None
            }
        },
        Err(e) => {
            tracing::warn!(collection = %collection, error = %e, "skipping malformed entry");
            None
        }
    }
}

/// Older exports carry timestamp ids as strings.  Numeric strings become
/// integers; anything else is dropped so the entry gets a fresh id.
fn coerce_id(collection: Collection, obj: &mut serde_json::Map<String, Value>) {
    let Some(Value::String(raw)) = obj.get("id") else {
        return;
    };
    match raw.trim().parse::<RecordId>() {
        Ok(id) => {
            obj.insert("id".into(), Value::from(id));
        }
        Err(_) => {
            tracing::warn!(collection = %collection, id = %raw, "dropping non-numeric id");
            obj.remove("id");
        }
    }
}

fn normalize_entry(collection: Collection, value: &Value) -> Option<(RecordId, String)> {
    match collection.entity_kind() {
        EntityKind::Character => normalize::<Character>(collection, value),
        EntityKind::Location => normalize::<Location>(collection, value),
        EntityKind::Mission => normalize::<Mission>(collection, value),
        EntityKind::Companion => normalize::<Companion>(collection, value),
        EntityKind::Expansion => normalize::<Expansion>(collection, value),
        EntityKind::Card => normalize::<CommunityCard>(collection, value),
        EntityKind::Story => normalize::<PublishedStory>(collection, value),
    }
}

fn replace_records(conn: &Connection, collection: Collection, values: &[Value]) -> Result<usize> {
    let kind = collection.entity_kind();
    conn.execute(
        "DELETE FROM records WHERE collection = ?1",
        params![collection.storage_key()],
    )?;

    let mut written = 0;
    let mut needs_id = Vec::new();
    for (id, body) in values.iter().filter_map(|v| normalize_entry(collection, v)) {
        if id <= 0 || find_collection(conn, kind, id)?.is_some() {
            tracing::warn!(collection = %collection, id, "entry needs a fresh id");
            needs_id.push(body);
            continue;
        }
        append_body(conn, collection, id, &body)?;
        written += 1;
    }

    for body in needs_id {
        let id = allocate_id(conn, kind)?;
        let mut value: Value = serde_json::from_str(&body)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("id".into(), Value::from(id));
        }
        append_body(conn, collection, id, &serde_json::to_string(&value)?)?;
        written += 1;
    }
    Ok(written)
}
