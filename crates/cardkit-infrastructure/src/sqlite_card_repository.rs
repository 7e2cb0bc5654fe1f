//! SQLite-backed CardRepository implementation.
//!
//! One `cards` table keyed by a generated UUID, with secondary indexes over
//! `created_at` and `updated_at` so ordered listings are index scans. The
//! pool is initialized lazily exactly once: every operation is safe to call
//! immediately after construction, and concurrent first callers all await
//! the same initialization.

use std::path::PathBuf;

use async_trait::async_trait;
use cardkit_core::card::CardEnvelope;
use cardkit_core::error::{CardError, Result};
use cardkit_core::repository::{
    CardPatch, CardRecord, CardRepository, NewCard, SortField, SortOrder,
};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::SqlitePool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::db::{self, DatabaseOptions};

/// Card record repository over an embedded SQLite database.
pub struct SqliteCardRepository {
    path: PathBuf,
    options: DatabaseOptions,
    pool: OnceCell<SqlitePool>,
}

/// Row shape of the `cards` table. The envelope is stored as a JSON column;
/// timestamps are stored through sqlx's chrono mapping so index order is
/// chronological order.
#[derive(Debug, FromRow)]
struct CardRow {
    id: String,
    card: String,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CardRow {
    fn into_record(self) -> Result<CardRecord> {
        let card: CardEnvelope = serde_json::from_str(&self.card)?;
        Ok(CardRecord {
            id: self.id,
            card,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, card, avatar_url, created_at, updated_at FROM cards";

impl SqliteCardRepository {
    /// Creates a repository over the database file at `path`.
    ///
    /// No I/O happens here; the pool and schema are set up on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, DatabaseOptions::default())
    }

    /// Creates a repository with explicit database options.
    pub fn with_options(path: impl Into<PathBuf>, options: DatabaseOptions) -> Self {
        Self {
            path: path.into(),
            options,
            pool: OnceCell::new(),
        }
    }

    /// Returns the pool, initializing it (and running migrations) exactly
    /// once. Concurrent first callers all await the same initialization.
    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                tracing::info!(path = %self.path.display(), "initializing card store");
                let pool = db::create_pool(&self.path, &self.options).await?;
                db::run_migrations(&pool).await?;
                Ok(pool)
            })
            .await
    }

    fn list_query(sort_by: SortField, order: SortOrder) -> String {
        let column = match sort_by {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        };
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        format!("{SELECT_COLUMNS} ORDER BY {column} {direction}")
    }
}

#[async_trait]
impl CardRepository for SqliteCardRepository {
    async fn add(&self, new: NewCard) -> Result<String> {
        let pool = self.pool().await?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let card_json = serde_json::to_string(&new.card)?;

        // A primary-key collision aborts the insert; with v4 ids that is a
        // consistency fault, not an expected condition.
        sqlx::query(
            "INSERT INTO cards (id, card, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&id)
        .bind(&card_json)
        .bind(&new.avatar_url)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .map_err(|e| CardError::database(format!("failed to add card record: {e}")))?;

        tracing::debug!(%id, "card record added");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<CardRecord>> {
        let pool = self.pool().await?;
        let row: Option<CardRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| CardError::database(format!("failed to get card record: {e}")))?;

        row.map(CardRow::into_record).transpose()
    }

    async fn get_all(&self, sort_by: SortField, order: SortOrder) -> Result<Vec<CardRecord>> {
        let pool = self.pool().await?;
        let rows: Vec<CardRow> = sqlx::query_as(&Self::list_query(sort_by, order))
            .fetch_all(pool)
            .await
            .map_err(|e| CardError::database(format!("failed to list card records: {e}")))?;

        rows.into_iter().map(CardRow::into_record).collect()
    }

    async fn update(&self, id: &str, patch: CardPatch) -> Result<()> {
        let pool = self.pool().await?;

        // Read-merge-write inside one transaction so concurrent updates to
        // the same id cannot interleave and lose a write.
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| CardError::database(format!("failed to begin update: {e}")))?;

        let row: Option<CardRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CardError::database(format!("failed to read card record: {e}")))?;

        let Some(existing) = row else {
            return Err(CardError::not_found("card record", id));
        };

        let card_json = match patch.card {
            Some(card) => serde_json::to_string(&card)?,
            None => existing.card,
        };
        let avatar_url = match patch.avatar_url {
            Some(avatar_url) => avatar_url,
            None => existing.avatar_url,
        };

        // id and created_at are deliberately not writable.
        sqlx::query("UPDATE cards SET card = ?1, avatar_url = ?2, updated_at = ?3 WHERE id = ?4")
            .bind(&card_json)
            .bind(&avatar_url)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| CardError::database(format!("failed to update card record: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| CardError::database(format!("failed to commit update: {e}")))?;

        tracing::debug!(%id, "card record updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM cards WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await
            .map_err(|e| CardError::database(format!("failed to delete card record: {e}")))?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query("DELETE FROM cards")
            .execute(pool)
            .await
            .map_err(|e| CardError::database(format!("failed to clear card store: {e}")))?;
        tracing::info!("card store cleared");
        Ok(())
    }
}
