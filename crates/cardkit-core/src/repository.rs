//! Card record repository contract.
//!
//! Defines the interface for the durable, indexed record store that holds
//! saved cards, decoupling the editor from the storage engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::CardEnvelope;
use crate::error::Result;

/// A saved card as it lives in the record store.
///
/// `id`, `created_at`, and `updated_at` are assigned by the store, never by
/// the caller. `created_at` is immutable for the lifetime of the record;
/// `updated_at` is refreshed on every update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    pub card: CardEnvelope,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied data for a new record. Identity and timestamps are the
/// store's to generate.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub card: CardEnvelope,
    pub avatar_url: Option<String>,
}

/// A partial update merged over an existing record.
///
/// Absent fields are left untouched. `avatar_url` distinguishes "leave as
/// is" (`None`) from "set to null" (`Some(None)`). The record's `id` and
/// `created_at` are never writable through a patch.
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub card: Option<CardEnvelope>,
    pub avatar_url: Option<Option<String>>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.card.is_none() && self.avatar_url.is_none()
    }
}

/// Timestamp column used to order listing scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
}

/// Listing scan direction. The default surfaces most-recently-edited first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// An abstract repository for saved card records.
///
/// All operations are asynchronous and must be safe to call before the
/// backing store has finished its lazy one-time initialization.
///
/// # Implementation Notes
///
/// Implementations must:
/// - Order `get_all` scans through a secondary index, not an in-memory sort
/// - Wrap `update` in a single transaction so concurrent updates to the same
///   id cannot lose a write
/// - Memoize initialization so concurrent first callers await the same setup
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Persists a new record with a freshly generated id and both timestamps
    /// set to now, returning the id.
    ///
    /// # Errors
    ///
    /// An id collision is a fatal consistency error surfaced as a database
    /// error; ids must carry enough entropy that this never happens in
    /// practice.
    async fn add(&self, new: NewCard) -> Result<String>;

    /// Fetches a record by id.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: Record found
    /// - `Ok(None)`: No record with this id; never an error
    async fn get(&self, id: &str) -> Result<Option<CardRecord>>;

    /// Lists every record ordered by the chosen timestamp column.
    async fn get_all(&self, sort_by: SortField, order: SortOrder) -> Result<Vec<CardRecord>>;

    /// Merges `patch` over the existing record and stamps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`CardError::NotFound`](crate::CardError::NotFound) when no
    /// record with this id exists.
    async fn update(&self, id: &str, patch: CardPatch) -> Result<()>;

    /// Removes a record. Deleting a non-existent id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Removes all records.
    async fn clear(&self) -> Result<()>;
}
