//! Draft editing for published records.
//!
//! An [`EntityEditor`] is either idle or holds a draft: a private copy of a
//! published record, or a freshly scaffolded one for "add new".  Field
//! mutations only touch the draft.  Nothing reaches the store until
//! [`EntityEditor::save`], which validates first and keeps the draft on
//! failure.
//!
//! [`EditorSuite`] bundles one editor per entity kind behind the
//! object-safe [`DraftEditor`] trait so the HTTP layer can dispatch on a
//! kind chosen at runtime.

use serde::Serialize;
use serde_json::Value;
use slab_shared::image::to_data_uri;
use slab_shared::schema::{apply_update, FieldSpec};
use slab_shared::{
    Character, Collection, CommunityCard, Companion, Entity, EntityKind, Expansion, Location,
    Mission, PublishedStory, RecordId, SchemaError,
};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::ids::allocate_id;
use crate::records::UpsertOutcome;

#[derive(Debug, Clone, PartialEq)]
enum EditorState<E> {
    Idle,
    Editing { draft: E, is_new: bool },
}

/// Draft/save state machine for one entity type.
#[derive(Debug, Clone)]
pub struct EntityEditor<E: Entity> {
    state: EditorState<E>,
}

impl<E: Entity> Default for EntityEditor<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityEditor<E> {
    pub fn new() -> Self {
        Self {
            state: EditorState::Idle,
        }
    }

    pub fn draft(&self) -> Option<&E> {
        match &self.state {
            EditorState::Editing { draft, .. } => Some(draft),
            EditorState::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditorState::Editing { .. })
    }

    /// True while the draft came from "add new" and was never saved.
    pub fn is_new(&self) -> bool {
        matches!(self.state, EditorState::Editing { is_new: true, .. })
    }

    fn draft_mut(&mut self) -> Result<&mut E> {
        match &mut self.state {
            EditorState::Editing { draft, .. } => Ok(draft),
            EditorState::Idle => Err(StoreError::NotEditing(E::KIND)),
        }
    }

    /// Copy a published record into the draft.  Any previous draft is
    /// discarded.
    pub fn select(&mut self, db: &Database, id: RecordId) -> Result<&E> {
        let draft = db.get_record::<E>(id)?;
        self.state = EditorState::Editing {
            draft,
            is_new: false,
        };
        self.draft_mut().map(|d| &*d)
    }

    /// Start a new record from the type's scaffold.  The id is allocated
    /// now and stays burned if the draft is cancelled.
    pub fn add_new(&mut self, db: &Database) -> Result<&E> {
        let id = allocate_id(db.conn(), E::KIND)?;
        self.state = EditorState::Editing {
            draft: E::scaffold(id),
            is_new: true,
        };
        tracing::debug!(kind = %E::KIND, id, "new draft");
        self.draft_mut().map(|d| &*d)
    }

    /// Set one scalar field on the draft.
    pub fn update(&mut self, field: &str, value: &str) -> Result<&E> {
        let draft = self.draft_mut()?;
        let mut json = serde_json::to_value(&*draft).map_err(SchemaError::from)?;
        apply_update(&mut json, E::fields(), field, value)?;
        *draft = serde_json::from_value(json).map_err(SchemaError::from)?;
        Ok(&*draft)
    }

    /// Store an uploaded image inline as a `data:` URI.
    pub fn set_image(&mut self, mime: &str, bytes: &[u8], max_size: usize) -> Result<&E> {
        let draft = self.draft_mut()?;
        let uri = to_data_uri(mime, bytes, max_size)?;
        let slot = draft
            .image_mut()
            .ok_or(StoreError::NoImage { kind: E::KIND })?;
        *slot = uri;
        Ok(&*draft)
    }

    /// Append a trimmed item to a list field.  Blank input is ignored.
    pub fn push_item(&mut self, field: &str, text: &str) -> Result<&E> {
        let draft = self.draft_mut()?;
        let list = draft.list_mut(field).ok_or_else(|| StoreError::NoSuchList {
            kind: E::KIND,
            field: field.to_string(),
        })?;
        let text = text.trim();
        if !text.is_empty() {
            list.push(text.to_string());
        }
        Ok(&*draft)
    }

    /// Remove the item at `index`, keeping the order of the rest.
    pub fn remove_item(&mut self, field: &str, index: usize) -> Result<&E> {
        let draft = self.draft_mut()?;
        let list = draft.list_mut(field).ok_or_else(|| StoreError::NoSuchList {
            kind: E::KIND,
            field: field.to_string(),
        })?;
        if index >= list.len() {
            return Err(SchemaError::IndexOutOfRange {
                index,
                len: list.len(),
            }
            .into());
        }
        list.remove(index);
        Ok(&*draft)
    }

    /// Drop the draft without writing.  Returns it, if there was one.
    pub fn cancel(&mut self) -> Option<E> {
        match std::mem::replace(&mut self.state, EditorState::Idle) {
            EditorState::Editing { draft, .. } => Some(draft),
            EditorState::Idle => None,
        }
    }

    /// Validate and write the draft, then return to idle.  On failure the
    /// draft is kept and nothing is written.
    pub fn save(&mut self, db: &mut Database) -> Result<(E, UpsertOutcome)> {
        let draft = self.draft_mut()?;
        let outcome = db.upsert_record(&*draft)?;
        let saved = self.cancel().ok_or(StoreError::NotEditing(E::KIND))?;
        Ok((saved, outcome))
    }

    /// Delete the drafted record from the store and return to idle.
    /// Returns whether a stored record was removed; an unsaved new draft is
    /// simply dropped.
    pub fn delete(&mut self, db: &Database) -> Result<(E, bool)> {
        let id = self.draft_mut()?.id();
        let removed = db.delete_record(E::KIND, id)?;
        let draft = self.cancel().ok_or(StoreError::NotEditing(E::KIND))?;
        Ok((draft, removed))
    }
}

impl EntityEditor<Character> {
    pub fn add_quote(&mut self, text: &str) -> Result<&Character> {
        self.push_item("quotes", text)
    }

    pub fn remove_quote(&mut self, index: usize) -> Result<&Character> {
        self.remove_item("quotes", index)
    }
}

// ---------------------------------------------------------------------------
// Runtime dispatch
// ---------------------------------------------------------------------------

/// A save as reported to callers that work with JSON.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecord {
    pub collection: Collection,
    pub id: RecordId,
    pub label: String,
    pub inserted: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecord {
    pub collection: Collection,
    pub id: RecordId,
    pub label: String,
    /// False when the draft was never saved.
    pub removed: bool,
}

/// Object-safe view of an [`EntityEditor`], with drafts as JSON.
pub trait DraftEditor: Send {
    fn kind(&self) -> EntityKind;
    fn fields(&self) -> &'static [FieldSpec];
    fn draft_value(&self) -> Result<Option<Value>>;
    fn is_new(&self) -> bool;
    fn select(&mut self, db: &Database, id: RecordId) -> Result<Value>;
    fn add_new(&mut self, db: &Database) -> Result<Value>;
    fn update(&mut self, field: &str, value: &str) -> Result<Value>;
    fn set_image(&mut self, mime: &str, bytes: &[u8], max_size: usize) -> Result<Value>;
    fn push_item(&mut self, field: &str, text: &str) -> Result<Value>;
    fn remove_item(&mut self, field: &str, index: usize) -> Result<Value>;
    fn cancel(&mut self) -> bool;
    fn save(&mut self, db: &mut Database) -> Result<SavedRecord>;
    fn delete(&mut self, db: &Database) -> Result<DeletedRecord>;
}

fn to_json<E: Entity>(record: &E) -> Result<Value> {
    Ok(serde_json::to_value(record)?)
}

impl<E: Entity> DraftEditor for EntityEditor<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    fn fields(&self) -> &'static [FieldSpec] {
        E::fields()
    }

    fn draft_value(&self) -> Result<Option<Value>> {
        self.draft().map(to_json).transpose()
    }

    fn is_new(&self) -> bool {
        EntityEditor::is_new(self)
    }

    fn select(&mut self, db: &Database, id: RecordId) -> Result<Value> {
        EntityEditor::select(self, db, id).and_then(to_json)
    }

    fn add_new(&mut self, db: &Database) -> Result<Value> {
        EntityEditor::add_new(self, db).and_then(to_json)
    }

    fn update(&mut self, field: &str, value: &str) -> Result<Value> {
        EntityEditor::update(self, field, value).and_then(to_json)
    }

    fn set_image(&mut self, mime: &str, bytes: &[u8], max_size: usize) -> Result<Value> {
        EntityEditor::set_image(self, mime, bytes, max_size).and_then(to_json)
    }

    fn push_item(&mut self, field: &str, text: &str) -> Result<Value> {
        EntityEditor::push_item(self, field, text).and_then(to_json)
    }

    fn remove_item(&mut self, field: &str, index: usize) -> Result<Value> {
        EntityEditor::remove_item(self, field, index).and_then(to_json)
    }

    fn cancel(&mut self) -> bool {
        EntityEditor::cancel(self).is_some()
    }

    fn save(&mut self, db: &mut Database) -> Result<SavedRecord> {
        let (saved, outcome) = EntityEditor::save(self, db)?;
        Ok(SavedRecord {
            collection: saved.collection(),
            id: saved.id(),
            label: saved.label().to_string(),
            inserted: outcome == UpsertOutcome::Inserted,
        })
    }

    fn delete(&mut self, db: &Database) -> Result<DeletedRecord> {
        let (draft, removed) = EntityEditor::delete(self, db)?;
        Ok(DeletedRecord {
            collection: draft.collection(),
            id: draft.id(),
            label: draft.label().to_string(),
            removed,
        })
    }
}

/// One editor per entity kind.
#[derive(Debug, Clone, Default)]
pub struct EditorSuite {
    pub characters: EntityEditor<Character>,
    pub locations: EntityEditor<Location>,
    pub missions: EntityEditor<Mission>,
    pub companions: EntityEditor<Companion>,
    pub expansions: EntityEditor<Expansion>,
    pub cards: EntityEditor<CommunityCard>,
    pub stories: EntityEditor<PublishedStory>,
}

impl EditorSuite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn editor(&mut self, kind: EntityKind) -> &mut dyn DraftEditor {
        match kind {
            EntityKind::Character => &mut self.characters,
            EntityKind::Location => &mut self.locations,
            EntityKind::Mission => &mut self.missions,
            EntityKind::Companion => &mut self.companions,
            EntityKind::Expansion => &mut self.expansions,
            EntityKind::Card => &mut self.cards,
            EntityKind::Story => &mut self.stories,
        }
    }

    /// Number of editors currently holding a draft.
    pub fn open_drafts(&self) -> usize {
        [
            self.characters.is_editing(),
            self.locations.is_editing(),
            self.missions.is_editing(),
            self.companions.is_editing(),
            self.expansions.is_editing(),
            self.cards.is_editing(),
            self.stories.is_editing(),
        ]
        .into_iter()
        .filter(|e| *e)
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slab_shared::types::CompanionKind;

    fn seeded() -> (Database, RecordId) {
        let mut db = Database::open_in_memory().unwrap();
        let bob = db
            .insert_record(Character {
                name: "Builder Bob".into(),
                quotes: vec!["one".into(), "two".into(), "three".into()],
                ..Default::default()
            })
            .unwrap();
        (db, bob.id)
    }

    #[test]
    fn draft_edits_do_not_touch_the_store_until_save() {
        let (mut db, id) = seeded();
        let mut editor = EntityEditor::<Character>::new();
        editor.select(&db, id).unwrap();
        editor.update("name", "Builder Robert").unwrap();
        assert_eq!(db.get_record::<Character>(id).unwrap().name, "Builder Bob");

        editor.save(&mut db).unwrap();
        assert!(!editor.is_editing());
        assert_eq!(
            db.get_record::<Character>(id).unwrap().name,
            "Builder Robert"
        );
    }

    #[test]
    fn cancel_never_mutates_the_collection() {
        let (db, id) = seeded();
        let before: Vec<Character> = db.list_records().unwrap();

        let mut editor = EntityEditor::<Character>::new();
        editor.select(&db, id).unwrap();
        editor.update("role", "Mayor").unwrap();
        editor.add_quote("four").unwrap();
        assert!(editor.cancel().is_some());

        editor.add_new(&db).unwrap();
        editor.cancel();

        let after: Vec<Character> = db.list_records().unwrap();
        assert_eq!(before, after);
        assert!(editor.cancel().is_none());
    }

    #[test]
    fn quotes_keep_their_order() {
        let (db, id) = seeded();
        let mut editor = EntityEditor::<Character>::new();
        editor.select(&db, id).unwrap();

        let draft = editor.add_quote("  four  ").unwrap();
        assert_eq!(draft.quotes, vec!["one", "two", "three", "four"]);
        editor.add_quote("   ").unwrap();
        assert_eq!(editor.draft().unwrap().quotes.len(), 4);

        let draft = editor.remove_quote(1).unwrap();
        assert_eq!(draft.quotes, vec!["one", "three", "four"]);
        assert!(matches!(
            editor.remove_quote(9),
            Err(StoreError::Schema(SchemaError::IndexOutOfRange { index: 9, len: 3 }))
        ));
    }

    #[test]
    fn blank_new_location_is_rejected_and_draft_kept() {
        let mut db = Database::open_in_memory().unwrap();
        let mut editor = EntityEditor::<Location>::new();
        editor.add_new(&db).unwrap();
        editor.update("name", "").unwrap();

        let err = editor.save(&mut db).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(editor.is_editing());
        assert_eq!(db.collection_len(Collection::Locations).unwrap(), 0);

        editor.update("name", "Slab Pool").unwrap();
        let (saved, outcome) = editor.save(&mut db).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(db.get_record::<Location>(saved.id).unwrap().name, "Slab Pool");
    }

    #[test]
    fn new_ids_are_never_reused() {
        let mut db = Database::open_in_memory().unwrap();
        let mut editor = EntityEditor::<Mission>::new();
        let burned = editor.add_new(&db).unwrap().id;
        editor.cancel();

        let id = editor.add_new(&db).unwrap().id;
        assert!(id > burned);
        editor.save(&mut db).unwrap();
        editor.select(&db, id).unwrap();
        editor.delete(&db).unwrap();

        assert!(editor.add_new(&db).unwrap().id > id);
    }

    #[test]
    fn update_refuses_bad_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut editor = EntityEditor::<Mission>::new();
        assert!(matches!(
            editor.update("title", "x"),
            Err(StoreError::NotEditing(EntityKind::Mission))
        ));
        editor.add_new(&db).unwrap();
        assert!(editor.update("difficulty", "Impossible").is_err());
        assert!(editor.update("id", "3").is_err());
        editor.update("difficulty", "Hard").unwrap();
        assert_eq!(
            editor.draft().unwrap().difficulty,
            slab_shared::types::Difficulty::Hard
        );
    }

    #[test]
    fn image_upload_becomes_data_uri() {
        let db = Database::open_in_memory().unwrap();
        let mut editor = EntityEditor::<Expansion>::new();
        editor.add_new(&db).unwrap();
        let draft = editor.set_image("image/png", b"png", 1024).unwrap();
        assert!(draft.image.starts_with("data:image/png;base64,"));

        let mut missions = EntityEditor::<Mission>::new();
        missions.add_new(&db).unwrap();
        assert!(matches!(
            missions.set_image("image/png", b"png", 1024),
            Err(StoreError::NoImage { .. })
        ));
    }

    #[test]
    fn suite_dispatches_by_kind() {
        let mut db = Database::open_in_memory().unwrap();
        let mut suite = EditorSuite::new();
        let editor = suite.editor(EntityKind::Companion);
        editor.add_new(&db).unwrap();
        editor.update("name", "Rattler").unwrap();
        let draft = editor.update("type", "spirit-guide").unwrap();
        assert_eq!(draft["type"], "spirit-guide");
        assert_eq!(suite.open_drafts(), 1);

        let saved = suite.editor(EntityKind::Companion).save(&mut db).unwrap();
        assert_eq!(saved.collection, Collection::SpiritGuides);
        assert!(saved.inserted);
        assert_eq!(suite.open_drafts(), 0);
        assert_eq!(
            db.get_record::<Companion>(saved.id).unwrap().kind,
            CompanionKind::SpiritGuide
        );
    }
}
