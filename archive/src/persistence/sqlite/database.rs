//! SQLite database connection pool and migration runner.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use crate::persistence::PersistenceError;

/// Holds a connection pool to the SQLite database.
///
/// Callers open one `Database`, hand it to the components that need it, and
/// call [`Database::close`] on shutdown.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the archive at `path` and bring its schema up to date.
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .synchronous(SqliteSynchronous::Normal);
        let db = Self::connect(options, 5).await?;

        tracing::info!(
            path = %path.display(),
            schema_version = ?db.schema_version().await?,
            "Opened game archive"
        );
        Ok(db)
    }

    /// In-memory archive for tests. A single connection, since every
    /// connection to `:memory:` would otherwise see its own empty database.
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?, 1).await
    }

    /// Apply the settings the chain relies on, build the pool, and migrate.
    ///
    /// Foreign keys must be on for `previous_id`/`next_id` to be checked.
    async fn connect(
        options: SqliteConnectOptions,
        max_connections: u32,
    ) -> Result<Self, PersistenceError> {
        let options = options
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let migrator = sqlx::migrate!("./migrations");
        migrator
            .run(&pool)
            .await
            .map_err(|e| PersistenceError::Migration(e.to_string()))?;
        tracing::debug!(
            migrations = migrator.iter().count(),
            "Archive schema migrated"
        );

        Ok(Self { pool })
    }

    /// Highest migration applied to this archive, if any.
    pub async fn schema_version(&self) -> Result<Option<i64>, PersistenceError> {
        let row: (Option<i64>,) =
            sqlx::query_as("SELECT MAX(version) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
