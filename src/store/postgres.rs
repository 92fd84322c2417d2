//! PostgreSQL store backend

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use super::{migrations, ProxyStore};
use crate::config::StoreConfig;
use crate::error::{PoolError, Result};

/// Store kept in two PostgreSQL tables: `store_hashes` and `store_lists`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new connection pool
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        info!(
            host = %config.host,
            port = %config.port,
            database = %config.name,
            "Connecting to store"
        );

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(30 * 60)) // 30 minutes
            .max_lifetime(Duration::from_secs(60 * 60)) // 1 hour
            .connect(&config.database_url())
            .await
            .map_err(|e| PoolError::StoreUnavailable(e.to_string()))?;

        info!("Store connection pool established");

        Ok(Self { pool })
    }

    /// Run store migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running store migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Store migrations completed");
        Ok(())
    }
}

#[async_trait]
impl ProxyStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PoolError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store_hashes WHERE key = $1)",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_fields(&self, key: &str, fields: &[(&str, &str)]) -> Result<bool> {
        let Some(((first_field, first_value), rest)) = fields.split_first() else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        // A concurrent creator blocks on the primary key until we commit.
        let inserted = sqlx::query(
            r#"
            INSERT INTO store_hashes (key, field, value)
            SELECT $1, $2, $3
            WHERE NOT EXISTS (SELECT 1 FROM store_hashes WHERE key = $1)
            ON CONFLICT (key, field) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(*first_field)
        .bind(*first_value)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (field, value) in rest {
            sqlx::query("INSERT INTO store_hashes (key, field, value) VALUES ($1, $2, $3)")
                .bind(key)
                .bind(*field)
                .bind(*value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn incr_field(&self, key: &str, field: &str, delta: i64) -> Result<Option<i64>> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO store_hashes (key, field, value)
            SELECT $1, $2, $3::TEXT
            WHERE EXISTS (SELECT 1 FROM store_hashes WHERE key = $1)
            ON CONFLICT (key, field)
            DO UPDATE SET value = (store_hashes.value::BIGINT + $3)::TEXT
            RETURNING value::BIGINT
            "#,
        )
        .bind(key)
        .bind(field)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn get_fields(&self, key: &str) -> Result<HashMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT field, value FROM store_hashes WHERE key = $1",
        )
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM store_hashes WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_append(&self, list_key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT INTO store_lists (list_key, value) VALUES ($1, $2)")
            .bind(list_key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_remove(&self, list_key: &str, value: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM store_lists WHERE list_key = $1 AND value = $2")
            .bind(list_key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_range(&self, list_key: &str) -> Result<Vec<String>> {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT value FROM store_lists WHERE list_key = $1 ORDER BY position",
        )
        .bind(list_key)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    async fn list_len(&self, list_key: &str) -> Result<u64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM store_lists WHERE list_key = $1")
                .bind(list_key)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }

    async fn purge(&self, list_key: &str, key_prefix: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM store_lists WHERE list_key = $1")
            .bind(list_key)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM store_hashes WHERE left(key, length($1)) = $1")
            .bind(key_prefix)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
