//! SQLite pool construction.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Open a pool for `database_url` and apply the embedded migrations.
///
/// In-memory URLs get exactly one long-lived connection; every SQLite
/// in-memory connection is a separate database. File databases run in WAL
/// mode, and a connection waits up to [`BUSY_TIMEOUT`] for the write lock
/// held by a concurrent batch.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let (options, pool_options) = if database_url.contains(":memory:") {
        let pool_options = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
        (options, pool_options)
    } else {
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        (options, SqlitePoolOptions::new().max_connections(5))
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::debug!("Database migrations applied");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_pool_has_schema() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        for table in ["doctors", "staff_monthly_salary", "patient_fee_payments"] {
            let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(&pool)
                .await
                .unwrap();
            assert!(row.is_some(), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn file_pool_uses_wal_journal() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("ledger.db").display());
        let pool = create_pool(&url).await.unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode, "wal");
    }
}
