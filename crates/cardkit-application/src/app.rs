//! Application composition root.
//!
//! The original design kept the record store behind a hidden process-wide
//! singleton; here the "one handle per process" requirement is met by
//! constructing everything once, explicitly, and injecting the handles into
//! the editor. Nothing below this function reaches for global state.

use std::sync::Arc;

use cardkit_core::codec::CardCodec;
use cardkit_core::error::Result;
use cardkit_core::repository::CardRepository;
use cardkit_infrastructure::{
    AppPaths, EditorConfig, FileSlot, HistoryCache, PngCardCodec, SqliteCardRepository,
};

use crate::editor::CardEditor;

/// A fully wired editor instance plus the handles the UI may need directly.
pub struct EditorApp {
    pub editor: Arc<CardEditor>,
    pub store: Arc<dyn CardRepository>,
    pub config: EditorConfig,
    pub paths: AppPaths,
}

impl EditorApp {
    /// Resolves platform paths, loads configuration, and assembles the
    /// editor. Store initialization itself stays lazy: the first repository
    /// call opens the database.
    pub fn bootstrap() -> Result<Self> {
        let paths = AppPaths::resolve()?;
        let config = EditorConfig::load(&paths.config_file())?;
        let paths = match &config.data_dir {
            Some(dir) => paths.with_data_dir(dir.clone()),
            None => paths,
        };
        Self::assemble(config, paths)
    }

    /// Assembles an editor over explicit paths. `bootstrap` delegates here;
    /// tests inject temporary directories the same way.
    pub fn assemble(config: EditorConfig, paths: AppPaths) -> Result<Self> {
        tracing::info!(data_dir = %paths.data_dir().display(), "assembling editor");

        let store: Arc<dyn CardRepository> =
            Arc::new(SqliteCardRepository::new(paths.database_file()));
        let slot = Arc::new(FileSlot::new(paths.slot_dir()));
        let history = HistoryCache::with_limit(slot, config.history_limit);
        let codec: Arc<dyn CardCodec> = Arc::new(PngCardCodec::new());
        let editor = Arc::new(CardEditor::new(codec, store.clone(), history));

        Ok(Self {
            editor,
            store,
            config,
            paths,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardkit_core::card::{FieldEdit, TextField};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_assembled_editor_is_usable_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::resolve().unwrap().with_data_dir(temp_dir.path());
        let app = EditorApp::assemble(EditorConfig::default(), paths).unwrap();

        app.editor.create_blank().await.unwrap();
        app.editor
            .edit_field(FieldEdit::Text(TextField::Scenario, "a tavern".into()))
            .await;
        let id = app.editor.save_to_store().await.unwrap();

        let record = app.store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.card.data.name, "Alice");
        assert_eq!(record.card.data.scenario, "a tavern");

        // Exporting through the real codec yields a decodable image
        let bytes = app.editor.export_current().await.unwrap();
        app.editor.reset().await;
        app.editor.load_from_source("export.png", &bytes).await.unwrap();
        assert_eq!(app.editor.snapshot().await.model.scenario, "a tavern");
    }

    #[tokio::test]
    async fn test_history_limit_comes_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AppPaths::resolve().unwrap().with_data_dir(temp_dir.path());
        let config = EditorConfig {
            history_limit: 2,
            ..EditorConfig::default()
        };
        let app = EditorApp::assemble(config, paths).unwrap();

        for (i, name) in ["Ada", "Bea", "Cyn"].iter().enumerate() {
            let bytes = format!(
                r#"{{"spec":"chara_card_v3","spec_version":"3.0","data":{{"name":"{name}","creation_date":{i}}}}}"#
            );
            // Each load is a fresh clean session, so no guard fires
            let encoded = {
                use cardkit_core::card::{CardEnvelope, RawEnvelope, normalize};
                use cardkit_core::codec::CardCodec as _;
                let envelope = RawEnvelope::parse(&bytes).unwrap();
                let data = normalize(envelope.data.unwrap()).unwrap();
                let codec = PngCardCodec::new();
                codec.encode(&CardEnvelope::v3(data), None).await.unwrap()
            };
            app.editor
                .load_from_source(&format!("{name}.png"), &encoded)
                .await
                .unwrap();
        }

        assert_eq!(app.editor.history().await.len(), 2);
    }
}
