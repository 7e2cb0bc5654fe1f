//! Session history domain model.
//!
//! A history entry is a deep-copied snapshot of a loaded card, kept in a
//! bounded recency list for quick session recovery. The list itself lives in
//! the infrastructure layer; this module owns the entry shape, the explicit
//! snapshot boundary, and the flat key-value slot primitive it persists to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::CardData;
use crate::error::Result;

/// One recoverable session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Deep-copied card snapshot; never aliases the live editable model.
    pub data: CardData,
    /// Avatar image as a data URL, when one was loaded.
    pub avatar: Option<String>,
    /// RFC 3339 capture time.
    pub timestamp: String,
    pub spec: String,
    pub spec_version: String,
}

impl HistoryEntry {
    /// Takes an explicit deep copy of the live model.
    ///
    /// This is the only way a card crosses into history, so aliasing between
    /// archived snapshots and the editable state cannot occur.
    pub fn snapshot(
        data: &CardData,
        avatar: Option<&str>,
        spec: &str,
        spec_version: &str,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            data: data.clone(),
            avatar: avatar.map(str::to_owned),
            timestamp: at.to_rfc3339(),
            spec: spec.to_owned(),
            spec_version: spec_version.to_owned(),
        }
    }

    /// Two entries describe the same logical session when name and first
    /// message match; recency wins over duplication.
    pub fn matches_key(&self, name: &str, first_mes: &str) -> bool {
        self.data.name == name && self.data.first_mes == first_mes
    }
}

/// A flat string key-value slot, the primitive the history cache persists
/// through. Deliberately simpler than the record store: no indexes, no
/// partial writes, whole values only.
pub trait KeyValueSlot: Send + Sync {
    /// Reads a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
