// ABOUTME: SQLite options backend
// ABOUTME: Stores each settings document as a JSON blob with a version counter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

use super::{OptionsBackend, StorageError, StorageResult};
use crate::types::{SettingsDocument, StoredOptions};

pub struct SqliteOptionsBackend {
    pool: SqlitePool,
}

impl SqliteOptionsBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url` and bring the schema up to date
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Sqlx)?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty database
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(if in_memory { None } else { Some(std::time::Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(std::time::Duration::from_secs(1800)) })
            .connect_with(options)
            .await
            .map_err(StorageError::Sqlx)?;

        let backend = Self::new(pool);
        backend.migrate().await?;
        debug!(url = %database_url, "Connected options database");
        Ok(backend)
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)
    }

    fn row_to_options(&self, row: SqliteRow) -> StorageResult<StoredOptions> {
        let value: String = row.try_get("value").map_err(StorageError::Sqlx)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(StorageError::Sqlx)?;

        Ok(StoredOptions {
            name: row.try_get("name").map_err(StorageError::Sqlx)?,
            version: row.try_get("version").map_err(StorageError::Sqlx)?,
            document: serde_json::from_str(&value)?,
            updated_at,
            updated_by: row.try_get("updated_by").map_err(StorageError::Sqlx)?,
        })
    }
}

#[async_trait]
impl OptionsBackend for SqliteOptionsBackend {
    async fn load(&self, name: &str) -> StorageResult<Option<StoredOptions>> {
        let row = sqlx::query(
            "SELECT name, value, version, updated_at, updated_by FROM options WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        row.map(|row| self.row_to_options(row)).transpose()
    }

    async fn persist(
        &self,
        name: &str,
        document: &SettingsDocument,
        updated_by: &str,
    ) -> StorageResult<StoredOptions> {
        let value = serde_json::to_string(document)?;
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO options (name, value, version, updated_at, updated_by)
             VALUES (?, ?, 1, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                version = options.version + 1,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
             RETURNING name, value, version, updated_at, updated_by",
        )
        .bind(name)
        .bind(&value)
        .bind(now)
        .bind(updated_by)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        self.row_to_options(row)
    }
}
