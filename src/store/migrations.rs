use crate::error::Result;
use sqlx::{PgConnection, PgPool};
use tracing::info;

/// Run all store migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    // Create migrations table if not exists
    create_migrations_table(pool).await?;

    for (version, name, statements) in get_migrations() {
        if !is_migration_applied(pool, version).await? {
            info!(version = version, name = name, "Applying migration");

            // Prepared statements hold one command each
            let mut tx = pool.begin().await?;
            for sql in statements {
                sqlx::query(sql).execute(&mut *tx).await?;
            }
            record_migration(&mut tx, version, name).await?;
            tx.commit().await?;

            info!(version = version, name = name, "Migration applied successfully");
        }
    }

    Ok(())
}

/// Create the migrations tracking table
async fn create_migrations_table(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Check if a migration has been applied
async fn is_migration_applied(pool: &PgPool, version: i32) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schema_migrations WHERE version = $1",
    )
    .bind(version)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Record a migration as applied
async fn record_migration(conn: &mut PgConnection, version: i32, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
        .bind(version)
        .bind(name)
        .execute(conn)
        .await?;

    Ok(())
}

/// Get all migrations in order
fn get_migrations() -> Vec<(i32, &'static str, &'static [&'static str])> {
    vec![
        (1, "store_hashes", MIGRATION_001_STORE_HASHES),
        (2, "store_lists", MIGRATION_002_STORE_LISTS),
    ]
}

// Migration 1: hash fields (one row per key/field)
const MIGRATION_001_STORE_HASHES: &[&str] = &[r#"
CREATE TABLE IF NOT EXISTS store_hashes (
    key TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (key, field)
)
"#];

// Migration 2: ordered lists
const MIGRATION_002_STORE_LISTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS store_lists (
    position BIGSERIAL PRIMARY KEY,
    list_key TEXT NOT NULL,
    value TEXT NOT NULL
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_store_lists_key ON store_lists(list_key, position)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_versions_are_ordered_and_unique() {
        let migrations = get_migrations();
        let versions: Vec<i32> = migrations.iter().map(|(v, _, _)| *v).collect();

        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_each_statement_is_a_single_command() {
        for (_, name, statements) in get_migrations() {
            assert!(!statements.is_empty(), "{} has no statements", name);
            for sql in statements {
                let body = sql.trim().trim_end_matches(';');
                assert!(!body.contains(';'), "{} packs several commands", name);
            }
        }
    }
}
