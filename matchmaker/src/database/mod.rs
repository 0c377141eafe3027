//! Database layer for the match engine.
//!
//! This module provides SQLite persistence for:
//! - Matches and their per-participant reveals
//! - The like and member tables the engine reads as collaborators
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `matches` - Match queries and guarded status updates
//! - `reveals` - Reveal queries and guarded status updates
//! - `directory` - Like and member store access
//!
//! The store is the only coordination point between instances. Nothing here
//! caches match or reveal state in memory.

pub(crate) mod directory;
pub(crate) mod matches;
pub(crate) mod reveals;
mod records;

pub use records::*;

use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, SqliteConnection};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::constants::transactions;
use crate::errors::{DatabaseError, EngineError, Result, TransactionError};

pub struct Database {
    pool: Pool<Sqlite>,
    transaction_timeout: Duration,
}

impl Database {
    /// Expose pool for integration test queries
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn transaction_timeout(&self) -> Duration {
        self.transaction_timeout
    }

    /// Open a database with default pool size and transaction timeout.
    pub async fn new(database_path: &str) -> Result<Self> {
        Self::open(
            database_path,
            transactions::MAX_CONNECTIONS,
            transactions::TIMEOUT,
        )
        .await
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(
            &config.database_path,
            config.max_connections,
            config.transaction_timeout(),
        )
        .await
    }

    /// Open (or create) the database at `database_path`. `":memory:"` gives a
    /// private in-memory database backed by a single connection.
    pub async fn open(
        database_path: &str,
        max_connections: u32,
        transaction_timeout: Duration,
    ) -> Result<Self> {
        info!("Opening database: {}", database_path);

        let in_memory = database_path == ":memory:";

        let pool = if in_memory {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| connection_failed(&e))?
                .foreign_keys(true)
                .busy_timeout(transaction_timeout);

            // Every connection to :memory: is its own database, so keep exactly one alive.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .map_err(|e| connection_failed(&e))?
        } else {
            if let Some(parent) = Path::new(database_path).parent() {
                if !parent.as_os_str().is_empty() {
                    debug!("Ensuring parent directory exists: {:?}", parent);
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| connection_failed(&e))?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .foreign_keys(true)
                .busy_timeout(transaction_timeout);

            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(transaction_timeout)
                .connect_with(options)
                .await
                .map_err(|e| {
                    error!("FAILED to connect to database {}: {}", database_path, e);
                    connection_failed(&e)
                })?
        };

        let database = Self {
            pool,
            transaction_timeout,
        };

        if let Err(e) = database.initialize_tables().await {
            error!("CRITICAL: Database table initialization failed: {}", e);
            return Err(e);
        }

        info!("Database ready: {}", database_path);
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        debug!("Creating members table...");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                image_url TEXT,
                city TEXT,
                video_url TEXT,
                video_thumbnail_url TEXT,
                last_active_at DATETIME,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_members_last_active ON members(last_active_at)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Creating likes table...");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS likes (
                source_user_id TEXT NOT NULL,
                target_user_id TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                PRIMARY KEY (source_user_id, target_user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Creating matches table...");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                user_id_1 TEXT NOT NULL,
                user_id_2 TEXT NOT NULL,
                status TEXT NOT NULL CHECK (status IN ('ACTIVE', 'DISSOLVED')),
                user1_video_snapshot TEXT,
                user2_video_snapshot TEXT,
                dissolved_at DATETIME,
                dissolved_by TEXT,
                dissolved_reason TEXT,
                created_at DATETIME NOT NULL,
                CHECK (user_id_1 < user_id_2)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_matches_pair ON matches(user_id_1, user_id_2)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_user2 ON matches(user_id_2)")
            .execute(&self.pool)
            .await?;

        debug!("Creating match_reveals table...");
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS match_reveals (
                id TEXT PRIMARY KEY,
                match_id TEXT NOT NULL REFERENCES matches(id),
                user_id TEXT NOT NULL,
                video_snapshot TEXT,
                status TEXT NOT NULL CHECK (status IN ('PENDING', 'REVEALED', 'DISMISSED')),
                created_at DATETIME NOT NULL,
                revealed_at DATETIME,
                last_shown_at DATETIME,
                dismissed_at DATETIME,
                UNIQUE (match_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_match_reveals_user_status ON match_reveals(user_id, status)",
        )
        .execute(&self.pool)
        .await?;

        info!("All database tables and indexes created");
        Ok(())
    }

    /// Run `body` inside a write-locking transaction bounded by the configured timeout.
    ///
    /// `BEGIN IMMEDIATE` takes SQLite's write lock before the first read, so
    /// every read-decide-write body runs serialized against all other writers.
    /// The bound covers the whole attempt: waiting for a pooled connection,
    /// waiting for the write lock, the body and the commit. A busy store
    /// surfaces as a serialization failure, an overrun as a timeout.
    ///
    /// The transaction is held in sqlx's `Transaction` guard. Any exit that
    /// does not reach `commit` (an error, the bound firing, or the caller
    /// dropping this future) rolls it back before the connection is reused.
    /// Nothing is retried here.
    pub(crate) async fn run_serializable<T, F>(&self, operation: &str, body: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let attempt = async {
            let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
            debug!("{}: transaction started", operation);

            let value = match body(&mut *tx).await {
                Ok(value) => value,
                Err(e) => {
                    debug!("{}: rolling back after error: {}", operation, e);
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!("{}: rollback failed: {}", operation, rollback_err);
                    }
                    return Err(e);
                }
            };

            tx.commit().await?;
            debug!("{}: committed", operation);
            Ok::<T, EngineError>(value)
        };

        match tokio::time::timeout(self.transaction_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{}: exceeded {}s, rolling back",
                    operation,
                    self.transaction_timeout.as_secs()
                );
                Err(TransactionError::Timeout {
                    operation: operation.to_string(),
                    timeout_seconds: self.transaction_timeout.as_secs(),
                }
                .into())
            }
        }
    }
}

fn connection_failed(e: &dyn std::fmt::Display) -> EngineError {
    DatabaseError::ConnectionFailed {
        reason: e.to_string(),
    }
    .into()
}
