//! Field-level edit operations.
//!
//! The editor applies user edits through this narrow, typed surface instead
//! of exposing the model for direct mutation. No validation happens here;
//! validation, where any exists, is the codec's concern at export time.

use serde_json::{Map, Value};

use crate::card::model::CardData;

/// Text fields addressable by a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Creator,
    CharacterVersion,
    Personality,
    Scenario,
    CreatorNotes,
    Nickname,
    SystemPrompt,
    PostHistoryInstructions,
    FirstMes,
    MesExample,
}

/// Ordered string-sequence fields addressable by a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Tags,
    AlternateGreetings,
    Source,
    GroupOnlyGreetings,
}

/// One user edit to the card model.
#[derive(Debug, Clone)]
pub enum FieldEdit {
    Text(TextField, String),
    List(ListField, Vec<String>),
    Assets(Vec<Value>),
    Extensions(Map<String, Value>),
    CreatorNotesMultilingual(Map<String, Value>),
}

/// Applies one edit to the model in place.
pub fn apply_edit(data: &mut CardData, edit: FieldEdit) {
    match edit {
        FieldEdit::Text(field, value) => {
            let slot = match field {
                TextField::Name => &mut data.name,
                TextField::Description => &mut data.description,
                TextField::Creator => &mut data.creator,
                TextField::CharacterVersion => &mut data.character_version,
                TextField::Personality => &mut data.personality,
                TextField::Scenario => &mut data.scenario,
                TextField::CreatorNotes => &mut data.creator_notes,
                TextField::Nickname => &mut data.nickname,
                TextField::SystemPrompt => &mut data.system_prompt,
                TextField::PostHistoryInstructions => &mut data.post_history_instructions,
                TextField::FirstMes => &mut data.first_mes,
                TextField::MesExample => &mut data.mes_example,
            };
            *slot = value;
        }
        FieldEdit::List(field, values) => {
            let slot = match field {
                ListField::Tags => &mut data.tags,
                ListField::AlternateGreetings => &mut data.alternate_greetings,
                ListField::Source => &mut data.source,
                ListField::GroupOnlyGreetings => &mut data.group_only_greetings,
            };
            *slot = values;
        }
        FieldEdit::Assets(assets) => data.assets = assets,
        FieldEdit::Extensions(extensions) => data.extensions = extensions,
        FieldEdit::CreatorNotesMultilingual(notes) => data.creator_notes_multilingual = notes,
    }
}
