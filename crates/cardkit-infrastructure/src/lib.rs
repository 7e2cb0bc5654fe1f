pub mod config;
pub mod db;
pub mod history_cache;
pub mod paths;
pub mod png_codec;
pub mod slot;
pub mod sqlite_card_repository;

pub use crate::config::EditorConfig;
pub use crate::history_cache::{DEFAULT_HISTORY_LIMIT, HISTORY_SLOT_KEY, HistoryCache};
pub use crate::paths::AppPaths;
pub use crate::png_codec::PngCardCodec;
pub use crate::slot::{FileSlot, MemorySlot};
pub use crate::sqlite_card_repository::SqliteCardRepository;
