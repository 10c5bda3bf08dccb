//! # Database Migrations
//!
//! Embedded SQL migrations for the key-value table.
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql` (e.g., `002_add_key_index.sql`)
//! 3. Write idempotent SQL (use `IF NOT EXISTS` where possible)
//! 4. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::StoreResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Idempotent; each migration runs in its own transaction and is recorded
/// in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total_migrations, applied_migrations)`.
pub async fn migration_status(pool: &SqlitePool) -> StoreResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DbConfig, SqliteStore};

    #[tokio::test]
    async fn test_all_migrations_applied() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        let (total, applied) = migration_status(store.pool()).await.unwrap();

        assert!(total >= 1);
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_status_without_migration_table_is_an_error() {
        let config = DbConfig::in_memory().run_migrations(false);
        let store = SqliteStore::connect(config).await.unwrap();

        let err = migration_status(store.pool()).await.unwrap_err();
        assert!(matches!(err, crate::error::StoreError::Storage(_)));
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let store = SqliteStore::connect(DbConfig::in_memory()).await.unwrap();
        store.run_migrations().await.unwrap();
    }
}
