//! Character card domain module.
//!
//! This module contains the editable card model, the decode-boundary raw
//! payload types, and the normalizer that maps arbitrary decoded payloads
//! into a complete, defaulted model.
//!
//! # Module Structure
//!
//! - `model`: Canonical editable card model (`CardData`, `CharacterBook`, `BookEntry`)
//! - `raw`: Decode-boundary payload types (`RawCard`, `RawBook`, `RawEnvelope`)
//! - `normalize`: Raw-to-model normalization
//! - `edit`: Field-level edit operations applied by the editor

mod edit;
mod model;
mod normalize;
mod raw;

// Re-export public API
pub use edit::{FieldEdit, ListField, TextField, apply_edit};
pub use model::{
    BookEntry, CardData, CardEnvelope, CharacterBook, EntryPosition, SPEC_V2, SPEC_V3,
    SPEC_VERSION_3,
};
pub use normalize::{normalize, normalize_at};
pub use raw::{RawBook, RawCard, RawEnvelope};
