//! Record id allocation.
//!
//! One counter per id space in `id_sequences`.  The next id is never below
//! one past the largest id already stored in the space, so records that
//! arrive through a backup import cannot collide with later allocations.

use rusqlite::{params, Connection, OptionalExtension};
use slab_shared::{EntityKind, RecordId};

use crate::error::Result;

pub(crate) fn allocate_id(conn: &Connection, kind: EntityKind) -> Result<RecordId> {
    let space = kind.id_space();
    let stored: Option<RecordId> = conn
        .query_row(
            "SELECT next_id FROM id_sequences WHERE space = ?1",
            params![space],
            |row| row.get(0),
        )
        .optional()?;

    let mut floor: RecordId = 1;
    for collection in kind.collections() {
        let max: RecordId = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM records WHERE collection = ?1",
            params![collection.storage_key()],
            |row| row.get(0),
        )?;
        floor = floor.max(max + 1);
    }

    let id = stored.unwrap_or(1).max(floor);
    conn.execute(
        "INSERT INTO id_sequences (space, next_id) VALUES (?1, ?2)
         ON CONFLICT(space) DO UPDATE SET next_id = excluded.next_id",
        params![space, id + 1],
    )?;
    Ok(id)
}
