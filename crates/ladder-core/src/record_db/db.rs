//! Connection and schema for the record database.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Key under which a file path is stored.
pub(super) fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Handle to the record database. Clones share one connection pool.
#[derive(Clone)]
pub struct RecordDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl RecordDb {
    /// `~/.local/state/ladder/records.db`, created on first use.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("ladder")?;
        Self::open_at(xdg_dirs.get_state_home().join("records.db")).await
    }

    /// Open or create the database file at `path`, creating parent directories.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .with_context(|| format!("open record db {}", path.display()))?;
        let db = RecordDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // modified_ms: file mtime (Unix ms) seen when the hash last matched.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS validate_records (
                path TEXT PRIMARY KEY NOT NULL,
                modified_ms INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resolve_records (
                identifier TEXT PRIMARY KEY NOT NULL,
                url TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory database for unit tests. One connection, so every query sees
/// the same memory database.
#[cfg(test)]
pub(crate) async fn open_memory() -> Result<RecordDb> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let db = RecordDb { pool };
    db.migrate().await?;
    Ok(db)
}
