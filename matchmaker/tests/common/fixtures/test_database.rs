//! Test database utilities

use matchmaker::database::Database;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// A file-backed database in a temporary directory.
///
/// Concurrency tests need several real connections, which an in-memory
/// SQLite database cannot provide.
pub struct TestDatabase {
    _dir: Option<TempDir>,
    database: Arc<Database>,
}

impl TestDatabase {
    /// On-disk database with an 8-connection pool
    pub async fn new() -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("matchmaker-test.db");
        let path = path.to_string_lossy().to_string();

        let database = Database::open(&path, 8, Duration::from_secs(10)).await?;

        Ok(Self {
            _dir: Some(dir),
            database: Arc::new(database),
        })
    }

    /// Single-connection in-memory database
    pub async fn in_memory() -> anyhow::Result<Self> {
        let database = Database::new(":memory:").await?;
        Ok(Self {
            _dir: None,
            database: Arc::new(database),
        })
    }

    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.database.pool()
    }

    pub async fn count_matches(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(self.pool())
            .await
            .expect("count matches")
    }

    pub async fn count_reveals(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM match_reveals")
            .fetch_one(self.pool())
            .await
            .expect("count reveals")
    }
}
