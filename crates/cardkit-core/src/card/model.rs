//! Canonical editable card model.
//!
//! This is the "pure" model that the editor and persistence layers operate
//! on. It is independent of any image container or storage format, and it is
//! always complete: every field is materialized with its documented default,
//! never `null`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Spec tag for version 3 character cards.
pub const SPEC_V3: &str = "chara_card_v3";
/// Spec tag for legacy version 2 character cards.
pub const SPEC_V2: &str = "chara_card_v2";
/// Spec version string written on export.
pub const SPEC_VERSION_3: &str = "3.0";

/// Spacing between the insertion orders of consecutively added book entries,
/// leaving room for manual reordering in between.
const INSERTION_ORDER_STEP: i64 = 100;

/// The outer wire wrapper around card field data at decode/encode boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardEnvelope {
    pub spec: String,
    pub spec_version: String,
    pub data: CardData,
}

impl CardEnvelope {
    /// Wraps card data in the canonical v3 envelope.
    pub fn v3(data: CardData) -> Self {
        Self {
            spec: SPEC_V3.to_string(),
            spec_version: SPEC_VERSION_3.to_string(),
            data,
        }
    }
}

/// The canonical editable representation of a character card.
///
/// Field semantics follow the embedded-card schema: plain text fields, ordered
/// string sequences (insertion order preserved, duplicates allowed at model
/// level), the character book, opaque pass-through fields (`assets`,
/// `extensions`, `creator_notes_multilingual`), and two epoch-second
/// timestamps. `creation_date` is preserved across edits once a card exists;
/// `modification_date` is restamped on every export.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CardData {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub creator: String,
    pub character_version: String,
    pub mes_example: String,
    pub system_prompt: String,
    pub post_history_instructions: String,
    pub first_mes: String,
    pub alternate_greetings: Vec<String>,
    pub personality: String,
    pub scenario: String,
    pub creator_notes: String,
    pub nickname: String,
    pub source: Vec<String>,
    pub group_only_greetings: Vec<String>,
    pub character_book: CharacterBook,
    pub assets: Vec<Value>,
    pub extensions: Map<String, Value>,
    pub creator_notes_multilingual: Map<String, Value>,
    pub creation_date: i64,
    pub modification_date: i64,
}

impl CardData {
    /// Returns true when no field carries meaningful content.
    ///
    /// Timestamps do not count: the normalizer always materializes them, so
    /// their presence says nothing about whether the user entered data.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.description.is_empty()
            && self.tags.is_empty()
            && self.creator.is_empty()
            && self.character_version.is_empty()
            && self.mes_example.is_empty()
            && self.system_prompt.is_empty()
            && self.post_history_instructions.is_empty()
            && self.first_mes.is_empty()
            && self.alternate_greetings.is_empty()
            && self.personality.is_empty()
            && self.scenario.is_empty()
            && self.creator_notes.is_empty()
            && self.nickname.is_empty()
            && self.source.is_empty()
            && self.group_only_greetings.is_empty()
            && self.character_book.is_empty()
            && self.assets.is_empty()
            && self.extensions.is_empty()
            && self.creator_notes_multilingual.is_empty()
    }
}

/// A character book: a named collection of keyed lore entries plus an open
/// extensions mapping.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterBook {
    pub name: String,
    pub entries: Vec<BookEntry>,
    pub extensions: Map<String, Value>,
}

impl CharacterBook {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.entries.is_empty() && self.extensions.is_empty()
    }

    /// Appends a fresh entry and returns a mutable reference to it.
    ///
    /// The entry gets a monotonically increasing `insertion_order` in steps
    /// of 100 and an `id` unique within this book (stable UI key, not
    /// globally unique across sessions).
    pub fn add_entry(&mut self) -> &mut BookEntry {
        let entry = BookEntry {
            insertion_order: (self.entries.len() as i64 + 1) * INSERTION_ORDER_STEP,
            id: self.next_entry_id(),
            ..BookEntry::default()
        };
        self.entries.push(entry);
        self.entries.last_mut().expect("entry was just pushed")
    }

    fn next_entry_id(&self) -> i64 {
        self.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1
    }
}

/// One lore entry of a character book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookEntry {
    pub keys: Vec<String>,
    pub secondary_keys: Vec<String>,
    pub comment: String,
    pub content: String,
    pub constant: bool,
    pub selective: bool,
    pub insertion_order: i64,
    pub enabled: bool,
    pub position: EntryPosition,
    pub extensions: Map<String, Value>,
    pub id: i64,
}

impl Default for BookEntry {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            secondary_keys: Vec::new(),
            comment: String::new(),
            content: String::new(),
            constant: false,
            selective: false,
            insertion_order: 0,
            enabled: true,
            position: EntryPosition::default(),
            extensions: Map::new(),
            id: 0,
        }
    }
}

/// Where a book entry is injected relative to the character definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPosition {
    BeforeChar,
    #[default]
    AfterChar,
}
