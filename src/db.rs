use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// One stored translation override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    pub id: i64,
    /// Normalized translation key
    pub key: String,
    /// Lowercased language or culture code
    pub language: String,
    pub value: String,
    /// Content type the override was entered for, if any
    pub content_type_name: Option<String>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
}

type OverrideRow = (i64, String, String, String, Option<String>, String, DateTime<Utc>);

impl From<OverrideRow> for OverrideRecord {
    fn from(row: OverrideRow) -> Self {
        let (id, key, language, value, content_type_name, modified_by, modified_at) = row;
        Self {
            id,
            key,
            language,
            value,
            content_type_name,
            modified_by,
            modified_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, key, language, value, content_type_name, modified_by, modified_at FROM localization_overrides";

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the database at `database_url` and create tables
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.create_tables().await?;
        info!("Override database ready at {}", database_url);
        Ok(db)
    }

    /// Private in-memory database. A single connection that never expires
    /// keeps the data alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.create_tables().await?;
        Ok(db)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS localization_overrides (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                language TEXT NOT NULL,
                value TEXT NOT NULL,
                content_type_name TEXT,
                modified_by TEXT NOT NULL,
                modified_at TEXT NOT NULL,
                UNIQUE(key, language)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_localization_overrides_language
             ON localization_overrides(language)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or update the override for `(key, language)`.
    ///
    /// Both must already be normalized by the caller.
    pub async fn upsert_override(
        &self,
        key: &str,
        language: &str,
        value: &str,
        content_type_name: Option<&str>,
        modified_by: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO localization_overrides
                (key, language, value, content_type_name, modified_by, modified_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(key, language) DO UPDATE SET
                value = excluded.value,
                content_type_name = excluded.content_type_name,
                modified_by = excluded.modified_by,
                modified_at = excluded.modified_at",
        )
        .bind(key)
        .bind(language)
        .bind(value)
        .bind(content_type_name)
        .bind(modified_by)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_override(&self, key: &str, language: &str) -> Result<Option<OverrideRecord>> {
        let row: Option<OverrideRow> = sqlx::query_as(&format!("{} WHERE key = ? AND language = ?", SELECT_COLUMNS))
            .bind(key)
            .bind(language)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(OverrideRecord::from))
    }

    /// All overrides ordered by key, then language
    pub async fn get_all_overrides(&self) -> Result<Vec<OverrideRecord>> {
        let rows: Vec<OverrideRow> = sqlx::query_as(&format!("{} ORDER BY key, language", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OverrideRecord::from).collect())
    }

    pub async fn get_overrides_by_language(&self, language: &str) -> Result<Vec<OverrideRecord>> {
        let rows: Vec<OverrideRow> = sqlx::query_as(&format!("{} WHERE language = ? ORDER BY key", SELECT_COLUMNS))
            .bind(language)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OverrideRecord::from).collect())
    }

    /// `(key, language, value)` of every override, for the read cache
    pub async fn load_override_values(&self) -> Result<Vec<(String, String, String)>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT key, language, value FROM localization_overrides")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// Returns true if a row was removed
    pub async fn delete_override(&self, key: &str, language: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM localization_overrides WHERE key = ? AND language = ?")
            .bind(key)
            .bind(language)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_override_by_id(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM localization_overrides WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the number of rows removed
    pub async fn delete_all_overrides(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM localization_overrides")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_overrides(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM localization_overrides")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
