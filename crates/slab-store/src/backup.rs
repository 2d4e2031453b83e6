//! Whole-store export and import, keyed by collection storage key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slab_shared::types::SubmissionKind;
use slab_shared::Collection;

use crate::database::Database;
use crate::error::Result;
use crate::records::replace_collection;

/// Full backup document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    /// RFC 3339 timestamp of when the backup was created
    #[serde(default)]
    pub created_at: String,
    /// App version that produced the backup
    #[serde(default)]
    pub version: String,
    /// Storage key -> array of records.
    pub collections: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub collections_replaced: usize,
    pub records_imported: usize,
    pub keys_skipped: Vec<String>,
}

fn all_keys() -> impl Iterator<Item = &'static str> {
    Collection::ALL
        .into_iter()
        .map(|c| c.storage_key())
        .chain(SubmissionKind::ALL.into_iter().map(|k| k.storage_key()))
}

impl Database {
    pub fn export_backup(&self) -> Result<BackupPayload> {
        let mut collections = BTreeMap::new();
        for key in all_keys() {
            collections.insert(key.to_string(), Value::Array(self.read_collection(key)?));
        }
        Ok(BackupPayload {
            created_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            collections,
        })
    }

    /// Replace every collection named in the payload, all in one
    /// transaction.  Collections the payload does not mention are left
    /// alone.  A value that is not an array replaces the collection with
    /// nothing.
    pub fn import_backup(&mut self, payload: &BackupPayload) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let tx = self.conn_mut().transaction()?;

        for (key, value) in &payload.collections {
            if !all_keys().any(|k| k == key) {
                tracing::warn!(key = %key, "skipping unknown backup key");
                stats.keys_skipped.push(key.clone());
                continue;
            }
            let entries: &[Value] = match value {
                Value::Array(items) => items,
                other => {
                    tracing::warn!(key = %key, kind = json_kind(other), "backup entry is not an array; treating as empty");
                    &[]
                }
            };
            stats.records_imported += replace_collection(&tx, key, entries)?;
            stats.collections_replaced += 1;
        }
        tx.commit()?;

        tracing::info!(
            collections = stats.collections_replaced,
            records = stats.records_imported,
            "backup imported"
        );
        Ok(stats)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slab_shared::submissions::StoryForm;
    use slab_shared::{Character, Mission};

    #[test]
    fn export_then_import_into_fresh_store() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_record(Character {
            name: "Generator Gina".into(),
            quotes: vec!["Power up".into()],
            ..Default::default()
        })
        .unwrap();
        db.submit_story(StoryForm {
            title: "Dust".into(),
            author: "Ann".into(),
            email: "a@x.com".into(),
            story: "Windy".into(),
        })
        .unwrap();
        let payload = db.export_backup().unwrap();
        assert_eq!(payload.collections.len(), 11);

        let mut fresh = Database::open_in_memory().unwrap();
        let stats = fresh.import_backup(&payload).unwrap();
        assert_eq!(stats.collections_replaced, 11);
        assert_eq!(stats.records_imported, 2);

        let characters: Vec<Character> = fresh.list_records().unwrap();
        assert_eq!(characters[0].quotes, vec!["Power up"]);
        let stories = fresh.list_submissions(SubmissionKind::Story).unwrap();
        assert_eq!(stories[0].form.title(), "Dust");
    }

    #[test]
    fn non_array_entries_become_empty() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_record(Mission {
            title: "Water Run".into(),
            ..Default::default()
        })
        .unwrap();

        let mut collections = BTreeMap::new();
        collections.insert("slabMissions".to_string(), json!({ "oops": true }));
        collections.insert("slabWhatever".to_string(), json!([]));
        let stats = db
            .import_backup(&BackupPayload {
                collections,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(stats.keys_skipped, vec!["slabWhatever".to_string()]);
        assert_eq!(db.collection_len(Collection::Missions).unwrap(), 0);
    }

    #[test]
    fn failed_import_leaves_the_store_untouched() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_record(Character {
            name: "Builder Bob".into(),
            ..Default::default()
        })
        .unwrap();
        db.conn()
            .execute_batch(
                "CREATE TRIGGER no_missions BEFORE INSERT ON records
                 WHEN NEW.collection = 'slabMissions'
                 BEGIN SELECT RAISE(ABORT, 'missions are read-only'); END;",
            )
            .unwrap();

        // Characters sort before missions, so they are replaced first.
        let mut collections = BTreeMap::new();
        collections.insert(
            "slabCharacters".to_string(),
            json!([{ "id": 9, "name": "Generator Gina" }]),
        );
        collections.insert(
            "slabMissions".to_string(),
            json!([{ "id": 1, "title": "Water Run" }]),
        );
        assert!(db
            .import_backup(&BackupPayload {
                collections,
                ..Default::default()
            })
            .is_err());

        let characters: Vec<Character> = db.list_records().unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Builder Bob");
    }
}
