//! SQLite connection pool setup.
//!
//! The pool itself is the only cross-request shared state in the server; its
//! concurrency safety is left to `sqlx`.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors raised while opening the store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to connect to SQLite at {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Open (creating if needed) the database file at `path` and apply migrations.
pub async fn open(path: impl AsRef<Path>, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }

    let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await
        .map_err(|source| StoreError::Connect {
            path: path.display().to_string(),
            source,
        })?;

    MIGRATOR.run(&pool).await?;

    tracing::info!(path = %path.display(), max_connections, "Store opened");
    Ok(pool)
}

/// Open a private in-memory database.
///
/// Every in-memory connection is its own database, so the pool is pinned to a
/// single connection that is never recycled.
pub async fn open_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(|source| StoreError::Connect {
            path: ":memory:".to_string(),
            source,
        })?;

    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
