// ABOUTME: SQLite persistence layer for Stagegate
// ABOUTME: Connection pool setup, migrations, and per-table store structs

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

pub mod approvals;
pub mod documents;
pub mod gates;
pub mod notifications;
pub mod projects;
pub mod snapshot;
pub mod users;

pub use approvals::{ApprovalStore, ApprovalWorkItem};
pub use documents::{DocumentCreateInput, DocumentStore};
pub use gates::GateStore;
pub use notifications::{NotificationCreateInput, NotificationStore};
pub use projects::{ProjectFilter, ProjectStore};
pub use snapshot::{DatabaseSnapshot, ImportResult};
pub use users::UserStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate user email: {0}")]
    DuplicateEmail(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub enable_wal: bool,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: stagegate_core::stagegate_dir().join("stagegate.db"),
            enable_wal: true,
            max_connections: 10,
            busy_timeout_seconds: 30,
        }
    }
}

impl StorageConfig {
    /// Configuration for an in-memory database. A single connection keeps
    /// every store looking at the same memory instance.
    pub fn memory() -> Self {
        Self {
            database_path: PathBuf::from(":memory:"),
            enable_wal: false,
            max_connections: 1,
            busy_timeout_seconds: 10,
        }
    }
}

/// Owns the connection pool and hands out per-table stores.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database described by `config`
    /// and apply pragmas. Call [`Database::migrate`] before using stores.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let is_memory = config.database_path == PathBuf::from(":memory:");

        if !is_memory {
            if let Some(parent) = config.database_path.parent() {
                std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
            }
        }

        let database_url = format!("sqlite:{}", config.database_path.display());

        if !is_memory
            && !sqlx::Sqlite::database_exists(&database_url)
                .await
                .map_err(StorageError::Sqlx)?
        {
            debug!("Creating database at: {}", database_url);
            sqlx::Sqlite::create_database(&database_url)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.busy_timeout_seconds))
            .connect(&database_url)
            .await
            .map_err(StorageError::Sqlx)?;

        if config.enable_wal {
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&pool)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(Self { pool })
    }

    /// Run embedded migrations.
    pub async fn migrate(&self) -> StorageResult<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Fully migrated in-memory database, for tests and ephemeral use.
    pub async fn memory() -> StorageResult<Self> {
        let db = Self::connect(&StorageConfig::memory()).await?;
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.pool.clone())
    }

    pub fn gates(&self) -> GateStore {
        GateStore::new(self.pool.clone())
    }

    pub fn approvals(&self) -> ApprovalStore {
        ApprovalStore::new(self.pool.clone())
    }

    pub fn documents(&self) -> DocumentStore {
        DocumentStore::new(self.pool.clone())
    }

    pub fn notifications(&self) -> NotificationStore {
        NotificationStore::new(self.pool.clone())
    }

    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }
}

/// Parse an RFC3339 TEXT column value.
pub(crate) fn parse_timestamp(
    value: &str,
    column: &str,
) -> StorageResult<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| StorageError::Database(format!("Invalid {column} timestamp")))
}

/// Parse an optional RFC3339 TEXT column value.
pub(crate) fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> StorageResult<Option<chrono::DateTime<chrono::Utc>>> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}
