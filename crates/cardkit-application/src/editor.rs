//! Editor state machine.
//!
//! `CardEditor` owns the live editable model and mediates between the codec,
//! the normalizer, the record store, and the session history cache. It is
//! the single mutator of editing state: UI collaborators call its operations
//! and read its snapshots, never the underlying layers directly.
//!
//! States move `Empty` -> `Loading` -> `Editing`, back to `Empty` on reset
//! or failed decode. Destructive operations (new load, blank card, history
//! or record restore) are guarded while unsaved edits exist; the paired
//! `confirm_*` variants are what the UI calls after the user approves
//! discarding them.

use std::sync::Arc;

use cardkit_core::card::{
    CardData, CardEnvelope, CharacterBook, FieldEdit, RawCard, SPEC_V3, SPEC_VERSION_3, apply_edit,
    normalize,
};
use cardkit_core::codec::CardCodec;
use cardkit_core::error::{CardError, Result};
use cardkit_core::history::HistoryEntry;
use cardkit_core::repository::{
    CardPatch, CardRecord, CardRepository, NewCard, SortField, SortOrder,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use cardkit_infrastructure::HistoryCache;

/// Coarse editor state exposed to UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// No card loaded.
    Empty,
    /// A decode or record fetch is in flight.
    Loading,
    /// A card is loaded and editable.
    Editing,
}

/// Read-only view of the current editing session.
#[derive(Debug, Clone)]
pub struct EditorSnapshot {
    pub state: EditorState,
    pub model: CardData,
    pub avatar: Option<String>,
    pub dirty: bool,
    pub loading: bool,
    pub original_file_name: String,
}

/// Provenance of the currently loaded card.
struct LoadedSource {
    spec: String,
    spec_version: String,
    /// Creation date frozen at load time; exports preserve it across edits.
    original_creation_date: i64,
    /// Record this session was loaded from or last saved to, if any.
    record_id: Option<String>,
}

struct EditorInner {
    source: Option<LoadedSource>,
    form: CardData,
    avatar: Option<String>,
    original_file: Option<Vec<u8>>,
    original_file_name: String,
    dirty: bool,
    loading: bool,
    history: HistoryCache,
}

impl EditorInner {
    /// Unconditional return to `Empty`. Loading is untouched: the in-flight
    /// flag is managed by the operation that set it.
    fn reset(&mut self) {
        self.source = None;
        self.form = CardData::default();
        self.avatar = None;
        self.original_file = None;
        self.original_file_name.clear();
        self.dirty = false;
    }

    fn record_history(&mut self, data: &CardData, avatar: Option<&str>, spec: &str, version: &str) {
        // History is a recovery convenience; a failed write never fails the load.
        if let Err(e) = self.history.record(data, avatar, spec, version) {
            tracing::warn!("failed to persist history entry: {e}");
        }
    }

    /// Builds the export envelope: empty sessions are rejected, the original
    /// creation date is preserved when one exists, and the modification date
    /// is stamped to now.
    fn export_envelope(&self, now: DateTime<Utc>) -> Result<CardEnvelope> {
        if self.source.is_none() && self.form.is_empty() {
            return Err(CardError::EmptyExport);
        }
        let mut data = self.form.clone();
        data.creation_date = match &self.source {
            Some(source) => source.original_creation_date,
            None if data.creation_date > 0 => data.creation_date,
            None => now.timestamp(),
        };
        data.modification_date = now.timestamp();
        Ok(CardEnvelope::v3(data))
    }
}

/// The editor use case.
///
/// Collaborators are injected by the composition root; all internal state
/// sits behind one `RwLock` so operations can be called from `&self` in
/// async contexts. Loads are serialized: a second load request while one is
/// in flight is rejected, never raced.
pub struct CardEditor {
    codec: Arc<dyn CardCodec>,
    store: Arc<dyn CardRepository>,
    inner: RwLock<EditorInner>,
}

impl CardEditor {
    pub fn new(
        codec: Arc<dyn CardCodec>,
        store: Arc<dyn CardRepository>,
        history: HistoryCache,
    ) -> Self {
        Self {
            codec,
            store,
            inner: RwLock::new(EditorInner {
                source: None,
                form: CardData::default(),
                avatar: None,
                original_file: None,
                original_file_name: String::new(),
                dirty: false,
                loading: false,
                history,
            }),
        }
    }

    /// Decodes an image byte stream and makes it the current session.
    ///
    /// On success the normalized model replaces the form, the dirty flag is
    /// cleared, and the session is recorded into history. On any decode or
    /// normalization failure the editor resets to `Empty` and the error is
    /// surfaced; no partial model is ever kept.
    ///
    /// # Errors
    ///
    /// - [`CardError::LoadInProgress`] while another load is in flight
    /// - [`CardError::UnsavedChanges`] while unsaved edits exist
    /// - [`CardError::Decode`] / [`CardError::BookParse`] from the payload
    pub async fn load_from_source(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            if inner.loading {
                return Err(CardError::LoadInProgress);
            }
            if inner.dirty {
                return Err(CardError::UnsavedChanges);
            }
            inner.loading = true;
        }

        let outcome = self.decode_and_normalize(bytes).await;

        let mut inner = self.inner.write().await;
        inner.loading = false;
        match outcome {
            Ok((data, avatar, spec, spec_version)) => {
                inner.record_history(&data, avatar.as_deref(), &spec, &spec_version);
                inner.source = Some(LoadedSource {
                    spec,
                    spec_version,
                    original_creation_date: data.creation_date,
                    record_id: None,
                });
                inner.form = data;
                inner.avatar = avatar;
                inner.original_file = Some(bytes.to_vec());
                inner.original_file_name = file_name.to_string();
                inner.dirty = false;
                tracing::info!(name = %inner.form.name, "card loaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(file_name, "card load failed: {e}");
                inner.reset();
                Err(e)
            }
        }
    }

    async fn decode_and_normalize(
        &self,
        bytes: &[u8],
    ) -> Result<(CardData, Option<String>, String, String)> {
        let decoded = self.codec.decode(bytes).await?;
        let data = normalize(decoded.card)?;
        Ok((data, decoded.avatar, decoded.spec, decoded.spec_version))
    }

    /// Starts a fresh starter card, guarded like any destructive load.
    pub async fn create_blank(&self) -> Result<()> {
        if self.inner.read().await.dirty {
            return Err(CardError::UnsavedChanges);
        }
        self.confirm_create_blank().await
    }

    /// Starts a fresh starter card, discarding unsaved edits.
    pub async fn confirm_create_blank(&self) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.loading {
            return Err(CardError::LoadInProgress);
        }

        let mut data = normalize(RawCard::default())?;
        data.name = "Alice".to_string();
        data.description = "Alice is a character".to_string();
        data.first_mes = "Hello".to_string();

        inner.source = Some(LoadedSource {
            spec: SPEC_V3.to_string(),
            spec_version: SPEC_VERSION_3.to_string(),
            original_creation_date: data.creation_date,
            record_id: None,
        });
        inner.form = data;
        inner.avatar = None;
        inner.original_file = None;
        inner.original_file_name = String::new();
        inner.dirty = false;
        Ok(())
    }

    /// Applies one field edit and marks the session dirty. No validation
    /// happens here; that is the codec's concern at export time.
    pub async fn edit_field(&self, edit: FieldEdit) {
        let mut inner = self.inner.write().await;
        apply_edit(&mut inner.form, edit);
        inner.dirty = true;
    }

    /// Replaces the character book and marks the session dirty.
    pub async fn edit_book(&self, book: CharacterBook) {
        let mut inner = self.inner.write().await;
        inner.form.character_book = book;
        inner.dirty = true;
    }

    /// Produces the exportable image for the current session.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::EmptyExport`] when nothing meaningful has been
    /// loaded or entered; no artifact is produced in that case.
    pub async fn export_current(&self) -> Result<Vec<u8>> {
        let (envelope, avatar) = {
            let inner = self.inner.read().await;
            (inner.export_envelope(Utc::now())?, inner.avatar.clone())
        };
        self.codec.encode(&envelope, avatar.as_deref()).await
    }

    /// Saves the current session as a card record, creating one on first
    /// save and updating it afterwards. Returns the record id and clears the
    /// dirty flag.
    pub async fn save_to_store(&self) -> Result<String> {
        let (existing_id, envelope, avatar) = {
            let inner = self.inner.read().await;
            let envelope = inner.export_envelope(Utc::now())?;
            (
                inner.source.as_ref().and_then(|s| s.record_id.clone()),
                envelope,
                inner.avatar.clone(),
            )
        };
        let creation_date = envelope.data.creation_date;

        let id = match existing_id {
            Some(id) => {
                self.store
                    .update(
                        &id,
                        CardPatch {
                            card: Some(envelope),
                            avatar_url: Some(avatar),
                        },
                    )
                    .await?;
                id
            }
            None => {
                self.store
                    .add(NewCard {
                        card: envelope,
                        avatar_url: avatar,
                    })
                    .await?
            }
        };

        let mut inner = self.inner.write().await;
        if let Some(source) = inner.source.as_mut() {
            source.record_id = Some(id.clone());
        } else {
            inner.source = Some(LoadedSource {
                spec: SPEC_V3.to_string(),
                spec_version: SPEC_VERSION_3.to_string(),
                original_creation_date: creation_date,
                record_id: Some(id.clone()),
            });
        }
        inner.dirty = false;
        tracing::info!(%id, "session saved to store");
        Ok(id)
    }

    /// Restores a saved record into the editor, guarded while dirty.
    pub async fn load_from_record(&self, id: &str) -> Result<()> {
        if self.inner.read().await.dirty {
            return Err(CardError::UnsavedChanges);
        }
        self.confirm_load_from_record(id).await
    }

    /// Restores a saved record, discarding unsaved edits.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::NotFound`] for an unknown id; the current
    /// session is left unchanged in that case.
    pub async fn confirm_load_from_record(&self, id: &str) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            if inner.loading {
                return Err(CardError::LoadInProgress);
            }
            inner.loading = true;
        }

        let fetched = self.store.get(id).await;

        let mut inner = self.inner.write().await;
        inner.loading = false;
        match fetched {
            Ok(Some(record)) => {
                let CardEnvelope {
                    spec,
                    spec_version,
                    data,
                } = record.card;
                inner.record_history(&data, record.avatar_url.as_deref(), &spec, &spec_version);
                inner.original_file_name = format!("Loaded from library: {}", data.name);
                inner.source = Some(LoadedSource {
                    spec,
                    spec_version,
                    original_creation_date: data.creation_date,
                    record_id: Some(record.id),
                });
                inner.form = data;
                inner.avatar = record.avatar_url;
                inner.original_file = None;
                inner.dirty = false;
                Ok(())
            }
            Ok(None) => Err(CardError::not_found("card record", id)),
            Err(e) => Err(e),
        }
    }

    /// Lists saved records through the store's indexed ordering.
    pub async fn list_records(
        &self,
        sort_by: SortField,
        order: SortOrder,
    ) -> Result<Vec<CardRecord>> {
        self.store.get_all(sort_by, order).await
    }

    /// Deletes a saved record. The current session stays loaded; it merely
    /// forgets its link to the record so the next save creates a fresh one.
    pub async fn delete_record(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        let mut inner = self.inner.write().await;
        if let Some(source) = inner.source.as_mut()
            && source.record_id.as_deref() == Some(id)
        {
            source.record_id = None;
        }
        Ok(())
    }

    /// Restores a history entry into the editor, guarded while dirty.
    pub async fn load_from_history(&self, index: usize) -> Result<()> {
        if self.inner.read().await.dirty {
            return Err(CardError::UnsavedChanges);
        }
        self.confirm_load_from_history(index).await
    }

    /// Restores a history entry, discarding unsaved edits. Restoring does
    /// not re-record history.
    pub async fn confirm_load_from_history(&self, index: usize) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.loading {
            return Err(CardError::LoadInProgress);
        }
        let Some(entry) = inner.history.get(index).cloned() else {
            return Err(CardError::not_found("history entry", index.to_string()));
        };

        let display_name = if entry.data.name.is_empty() {
            "Unnamed".to_string()
        } else {
            entry.data.name.clone()
        };
        inner.source = Some(LoadedSource {
            spec: entry.spec,
            spec_version: entry.spec_version,
            original_creation_date: entry.data.creation_date,
            record_id: None,
        });
        inner.avatar = entry.avatar;
        inner.form = entry.data;
        inner.original_file = None;
        inner.original_file_name = format!("Loaded from history: {display_name}");
        inner.dirty = false;
        Ok(())
    }

    /// Returns history entries, newest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.inner.read().await.history.list().to_vec()
    }

    /// Empties the session history cache.
    pub async fn clear_history(&self) -> Result<()> {
        self.inner.write().await.history.clear()
    }

    /// Discards the session unconditionally. Reserved for explicit
    /// user-initiated "start over" actions.
    pub async fn reset(&self) {
        let mut inner = self.inner.write().await;
        inner.reset();
        tracing::info!("editor state reset");
    }

    /// Returns the originally loaded file bytes, when this session came from
    /// a file load.
    pub async fn original_file(&self) -> Option<Vec<u8>> {
        self.inner.read().await.original_file.clone()
    }

    /// Read-only view of the current session.
    pub async fn snapshot(&self) -> EditorSnapshot {
        let inner = self.inner.read().await;
        EditorSnapshot {
            state: if inner.loading {
                EditorState::Loading
            } else if inner.source.is_some() {
                EditorState::Editing
            } else {
                EditorState::Empty
            },
            model: inner.form.clone(),
            avatar: inner.avatar.clone(),
            dirty: inner.dirty,
            loading: inner.loading,
            original_file_name: inner.original_file_name.clone(),
        }
    }

    pub async fn is_dirty(&self) -> bool {
        self.inner.read().await.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cardkit_core::card::{ListField, RawEnvelope, TextField};
    use cardkit_core::codec::DecodedCard;
    use cardkit_infrastructure::{MemorySlot, SqliteCardRepository};
    use tempfile::TempDir;

    /// Codec over plain JSON envelopes; the editor never looks inside the
    /// byte stream, so tests skip the image container entirely.
    struct JsonCodec;

    #[async_trait]
    impl CardCodec for JsonCodec {
        async fn decode(&self, bytes: &[u8]) -> Result<DecodedCard> {
            let json = std::str::from_utf8(bytes)
                .map_err(|e| CardError::decode(format!("not UTF-8: {e}")))?;
            let envelope = RawEnvelope::parse(json)
                .map_err(|e| CardError::decode(format!("not a card payload: {e}")))?;
            Ok(DecodedCard {
                card: envelope.data.unwrap_or_default(),
                avatar: Some("data:image/png;base64,dGVzdA==".to_string()),
                spec: envelope.spec.unwrap_or_else(|| SPEC_V3.to_string()),
                spec_version: envelope
                    .spec_version
                    .unwrap_or_else(|| SPEC_VERSION_3.to_string()),
            })
        }

        async fn encode(&self, envelope: &CardEnvelope, _avatar: Option<&str>) -> Result<Vec<u8>> {
            Ok(serde_json::to_vec(envelope)?)
        }
    }

    fn test_editor(temp_dir: &TempDir) -> CardEditor {
        let store = Arc::new(SqliteCardRepository::new(temp_dir.path().join("cards.db")));
        let history = HistoryCache::new(Arc::new(MemorySlot::new()));
        CardEditor::new(Arc::new(JsonCodec), store, history)
    }

    fn card_bytes(name: &str, first_mes: &str, creation_date: i64) -> Vec<u8> {
        format!(
            r#"{{"spec":"chara_card_v3","spec_version":"3.0","data":{{"name":"{name}","first_mes":"{first_mes}","creation_date":{creation_date}}}}}"#
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_successful_load_populates_session() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.state, EditorState::Editing);
        assert_eq!(snapshot.model.name, "Alice");
        assert!(!snapshot.dirty);
        assert_eq!(snapshot.original_file_name, "alice.png");
        assert!(editor.original_file().await.is_some());

        // History recording is a side effect of every successful load
        let history = editor.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].data.name, "Alice");
    }

    #[tokio::test]
    async fn test_load_while_dirty_is_rejected_and_model_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        editor
            .edit_field(FieldEdit::Text(TextField::Scenario, "a tavern".into()))
            .await;

        let err = editor
            .load_from_source("bob.png", &card_bytes("Bob", "Hi", 2000))
            .await
            .unwrap_err();
        assert!(err.is_unsaved_changes());

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.model.name, "Alice");
        assert_eq!(snapshot.model.scenario, "a tavern");
        assert!(snapshot.dirty);
    }

    #[tokio::test]
    async fn test_failed_decode_resets_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let err = editor
            .load_from_source("junk.png", b"\xff\xfe not json")
            .await
            .unwrap_err();
        assert!(err.is_decode());

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.state, EditorState::Empty);
        assert!(!snapshot.dirty);
        assert!(snapshot.model.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_string_book_fails_the_load() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let bytes =
            br#"{"spec":"chara_card_v3","spec_version":"3.0","data":{"name":"Alice","character_book":"{broken"}}"#;
        let err = editor.load_from_source("alice.png", bytes).await.unwrap_err();
        assert!(matches!(err, CardError::BookParse(_)));
        assert_eq!(editor.snapshot().await.state, EditorState::Empty);
    }

    #[tokio::test]
    async fn test_string_book_is_normalized_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let bytes = br#"{"spec":"chara_card_v3","spec_version":"3.0","data":{"name":"Alice","character_book":"{\"name\":\"Lore\",\"entries\":[]}"}}"#;
        editor.load_from_source("alice.png", bytes).await.unwrap();

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.model.character_book.name, "Lore");
        assert!(snapshot.model.character_book.entries.is_empty());
    }

    #[tokio::test]
    async fn test_export_with_no_data_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let err = editor.export_current().await.unwrap_err();
        assert!(err.is_empty_export());
    }

    #[tokio::test]
    async fn test_export_preserves_creation_date_across_edits() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 12345))
            .await
            .unwrap();
        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Alice II".into()))
            .await;

        let bytes = editor.export_current().await.unwrap();
        let exported: CardEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(exported.spec, SPEC_V3);
        assert_eq!(exported.data.name, "Alice II");
        assert_eq!(exported.data.creation_date, 12345);
        assert!(exported.data.modification_date > 12345);
    }

    #[tokio::test]
    async fn test_manual_entry_without_load_is_exportable() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Scratch".into()))
            .await;
        editor
            .edit_field(FieldEdit::List(ListField::Tags, vec!["draft".into()]))
            .await;

        let bytes = editor.export_current().await.unwrap();
        let exported: CardEnvelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(exported.data.name, "Scratch");
        assert!(exported.data.creation_date > 0);
    }

    #[tokio::test]
    async fn test_create_blank_seeds_starter_card() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor.create_blank().await.unwrap();
        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.state, EditorState::Editing);
        assert_eq!(snapshot.model.name, "Alice");
        assert_eq!(snapshot.model.first_mes, "Hello");
        assert!(!snapshot.dirty);

        // Blank cards are not a load; nothing goes into history
        assert!(editor.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_blank_is_guarded_while_dirty() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Keep me".into()))
            .await;
        let err = editor.create_blank().await.unwrap_err();
        assert!(err.is_unsaved_changes());
        assert_eq!(editor.snapshot().await.model.name, "Keep me");

        editor.confirm_create_blank().await.unwrap();
        assert_eq!(editor.snapshot().await.model.name, "Alice");
    }

    #[tokio::test]
    async fn test_history_restore_is_guarded_and_confirmable() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Renamed".into()))
            .await;

        let err = editor.load_from_history(0).await.unwrap_err();
        assert!(err.is_unsaved_changes());

        editor.confirm_load_from_history(0).await.unwrap();
        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.model.name, "Alice");
        assert!(!snapshot.dirty);

        // Restoring does not grow history
        assert_eq!(editor.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_restore_with_bad_index_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let err = editor.load_from_history(7).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_creates_then_updates_one_record() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        let first_id = editor.save_to_store().await.unwrap();
        assert!(!editor.is_dirty().await);

        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Alice II".into()))
            .await;
        let second_id = editor.save_to_store().await.unwrap();
        assert_eq!(first_id, second_id);
        assert!(!editor.is_dirty().await);

        let records = editor
            .list_records(SortField::default(), SortOrder::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].card.data.name, "Alice II");
        assert_eq!(records[0].card.data.creation_date, 1000);
    }

    #[tokio::test]
    async fn test_save_with_no_data_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        let err = editor.save_to_store().await.unwrap_err();
        assert!(err.is_empty_export());
    }

    #[tokio::test]
    async fn test_record_restore_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        let id = editor.save_to_store().await.unwrap();
        editor.reset().await;
        assert_eq!(editor.snapshot().await.state, EditorState::Empty);

        editor.load_from_record(&id).await.unwrap();
        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.state, EditorState::Editing);
        assert_eq!(snapshot.model.name, "Alice");

        // The restored session stays linked to its record
        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Alice III".into()))
            .await;
        let saved_id = editor.save_to_store().await.unwrap();
        assert_eq!(saved_id, id);
    }

    #[tokio::test]
    async fn test_record_restore_unknown_id_leaves_session_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        let err = editor.load_from_record("no-such-id").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(editor.snapshot().await.model.name, "Alice");
    }

    #[tokio::test]
    async fn test_delete_record_unlinks_current_session() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        let id = editor.save_to_store().await.unwrap();
        editor.delete_record(&id).await.unwrap();

        // The next save must create a fresh record, not update a ghost
        let new_id = editor.save_to_store().await.unwrap();
        assert_ne!(new_id, id);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        editor
            .edit_field(FieldEdit::Text(TextField::Name, "Changed".into()))
            .await;
        editor.reset().await;

        let snapshot = editor.snapshot().await;
        assert_eq!(snapshot.state, EditorState::Empty);
        assert!(snapshot.model.is_empty());
        assert!(snapshot.avatar.is_none());
        assert!(snapshot.original_file_name.is_empty());
        assert!(editor.original_file().await.is_none());
        assert!(!snapshot.dirty);
    }

    #[tokio::test]
    async fn test_reloading_same_card_dedupes_history() {
        let temp_dir = TempDir::new().unwrap();
        let editor = test_editor(&temp_dir);

        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();
        editor
            .load_from_source("bob.png", &card_bytes("Bob", "Hi", 2000))
            .await
            .unwrap();
        editor
            .load_from_source("alice.png", &card_bytes("Alice", "Hello", 1000))
            .await
            .unwrap();

        let history = editor.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data.name, "Alice");
        assert_eq!(history[1].data.name, "Bob");
    }
}
