//! Session history cache.
//!
//! A bounded, deduplicated recency list of recently loaded cards, persisted
//! whole to a flat key-value slot on every mutation. This is explicitly NOT
//! the durable record store: it is a recovery buffer, bounded and lossy by
//! design - the oldest entries are silently evicted past the cap.

use std::sync::Arc;

use cardkit_core::card::CardData;
use cardkit_core::error::Result;
use cardkit_core::history::{HistoryEntry, KeyValueSlot};
use chrono::Utc;

/// Slot key the serialized history list lives under.
pub const HISTORY_SLOT_KEY: &str = "cc_editor_history";

/// Maximum retained entries unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Bounded recency list over a [`KeyValueSlot`].
///
/// Mutation goes through `&mut self`: the editor is the cache's only writer,
/// so no interior locking is needed.
pub struct HistoryCache {
    slot: Arc<dyn KeyValueSlot>,
    limit: usize,
    entries: Vec<HistoryEntry>,
}

impl HistoryCache {
    /// Opens the cache with the default retention limit.
    pub fn new(slot: Arc<dyn KeyValueSlot>) -> Self {
        Self::with_limit(slot, DEFAULT_HISTORY_LIMIT)
    }

    /// Opens the cache, loading any previously persisted list.
    ///
    /// A corrupt persisted list is logged and treated as empty rather than
    /// failing startup: the cache is a convenience buffer, not a source of
    /// truth.
    pub fn with_limit(slot: Arc<dyn KeyValueSlot>, limit: usize) -> Self {
        let entries = match slot.get(HISTORY_SLOT_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<HistoryEntry>>(&json) {
                Ok(mut entries) => {
                    entries.truncate(limit);
                    entries
                }
                Err(e) => {
                    tracing::warn!("discarding corrupt history list: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("failed to read history slot: {e}");
                Vec::new()
            }
        };
        Self {
            slot,
            limit,
            entries,
        }
    }

    /// Appends a deep-copied snapshot of `data`.
    ///
    /// Unnamed cards are skipped. An existing entry with the same
    /// `(name, first_mes)` key is removed first, so recency always wins over
    /// duplication; the list is then truncated to the retention limit and
    /// persisted whole.
    pub fn record(
        &mut self,
        data: &CardData,
        avatar: Option<&str>,
        spec: &str,
        spec_version: &str,
    ) -> Result<()> {
        if data.name.is_empty() {
            tracing::debug!("skipping history record for unnamed card");
            return Ok(());
        }

        let entry = HistoryEntry::snapshot(data, avatar, spec, spec_version, Utc::now());
        self.entries
            .retain(|e| !e.matches_key(&data.name, &data.first_mes));
        self.entries.insert(0, entry);
        self.entries.truncate(self.limit);
        self.persist()
    }

    /// Returns all entries, newest first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns the entry at `index` (0 = newest), if any.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empties both the in-memory list and the persisted slot.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.slot.remove(HISTORY_SLOT_KEY)
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        self.slot.set(HISTORY_SLOT_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;

    fn card(name: &str, first_mes: &str) -> CardData {
        CardData {
            name: name.to_string(),
            first_mes: first_mes.to_string(),
            ..CardData::default()
        }
    }

    fn record(cache: &mut HistoryCache, name: &str, first_mes: &str) {
        cache
            .record(&card(name, first_mes), None, "chara_card_v3", "3.0")
            .unwrap();
    }

    #[test]
    fn test_newest_entries_come_first() {
        let mut cache = HistoryCache::new(Arc::new(MemorySlot::new()));
        record(&mut cache, "Alice", "Hello");
        record(&mut cache, "Bob", "Hi");

        let names: Vec<&str> = cache.list().iter().map(|e| e.data.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_cap_is_never_exceeded() {
        let mut cache = HistoryCache::with_limit(Arc::new(MemorySlot::new()), 3);
        for i in 0..10 {
            record(&mut cache, &format!("card-{i}"), "Hello");
        }
        assert_eq!(cache.len(), 3);
        // The newest survive
        assert_eq!(cache.get(0).unwrap().data.name, "card-9");
        assert_eq!(cache.get(2).unwrap().data.name, "card-7");
    }

    #[test]
    fn test_duplicate_key_keeps_exactly_one_entry_positioned_first() {
        let mut cache = HistoryCache::new(Arc::new(MemorySlot::new()));
        record(&mut cache, "Alice", "Hello");
        record(&mut cache, "Bob", "Hi");
        record(&mut cache, "Alice", "Hello");

        let matches: Vec<usize> = cache
            .list()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches_key("Alice", "Hello"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(matches, vec![0]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_same_name_different_first_mes_are_distinct_sessions() {
        let mut cache = HistoryCache::new(Arc::new(MemorySlot::new()));
        record(&mut cache, "Alice", "Hello");
        record(&mut cache, "Alice", "Good evening");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_unnamed_cards_are_skipped() {
        let mut cache = HistoryCache::new(Arc::new(MemorySlot::new()));
        record(&mut cache, "", "Hello");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_list_survives_reload_from_slot() {
        let slot = Arc::new(MemorySlot::new());
        {
            let mut cache = HistoryCache::new(slot.clone());
            record(&mut cache, "Alice", "Hello");
            record(&mut cache, "Bob", "Hi");
        }
        let reloaded = HistoryCache::new(slot);
        let names: Vec<&str> = reloaded
            .list()
            .iter()
            .map(|e| e.data.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "Alice"]);
    }

    #[test]
    fn test_corrupt_slot_content_starts_empty() {
        let slot = Arc::new(MemorySlot::new());
        slot.set(HISTORY_SLOT_KEY, "this is not json").unwrap();
        let cache = HistoryCache::new(slot);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_empties_slot_too() {
        let slot = Arc::new(MemorySlot::new());
        let mut cache = HistoryCache::new(slot.clone());
        record(&mut cache, "Alice", "Hello");
        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert_eq!(slot.get(HISTORY_SLOT_KEY).unwrap(), None);
    }
}
