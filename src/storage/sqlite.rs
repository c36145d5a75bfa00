use super::{Result, Storage, StorageError};
use crate::models::Mapping;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, url, short_code, created_at, updated_at, access_count";

/// [`Storage`] backed by the `mappings` table. The `UNIQUE` index on
/// `short_code` is what rejects colliding inserts.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations (files in migrations/).
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>> {
        let mapping: Option<Mapping> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM mappings WHERE short_code = ?1"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        Ok(mapping)
    }

    /// Oldest mapping for `url`, if any.
    async fn find_by_url(&self, url: &str) -> Result<Option<Mapping>> {
        let mapping: Option<Mapping> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM mappings WHERE url = ?1 ORDER BY created_at ASC LIMIT 1"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn insert(&self, mapping: Mapping) -> Result<Mapping> {
        let result = sqlx::query(
            "INSERT INTO mappings (id, url, short_code, created_at, updated_at, access_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&mapping.id)
        .bind(&mapping.url)
        .bind(&mapping.short_code)
        .bind(mapping.created_at)
        .bind(mapping.updated_at)
        .bind(mapping.access_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(mapping),
            Err(e) if is_short_code_violation(&e) => {
                Err(StorageError::CodeTaken(mapping.short_code))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_url(&self, code: &str, url: &str) -> Result<Option<Mapping>> {
        let mapping: Option<Mapping> = sqlx::query_as(&format!(
            "UPDATE mappings SET url = ?1, updated_at = ?2 WHERE short_code = ?3 RETURNING {COLUMNS}"
        ))
        .bind(url)
        .bind(Utc::now())
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn increment_access_count(&self, code: &str) -> Result<bool> {
        let affected = sqlx::query(
            "UPDATE mappings SET access_count = access_count + 1, updated_at = ?1
             WHERE short_code = ?2",
        )
        .bind(Utc::now())
        .bind(code)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM mappings WHERE short_code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}

/// SQLite reports "UNIQUE constraint failed: mappings.short_code". A clash on
/// any other column is not a code collision and is passed through as-is.
fn is_short_code_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            (db_err.is_unique_violation() || message.starts_with("UNIQUE constraint failed"))
                && message.contains("short_code")
        }
        _ => false,
    }
}
