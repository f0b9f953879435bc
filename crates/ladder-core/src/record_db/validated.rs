//! Validation cache rows: last validated modification time per path.

use anyhow::Result;
use sqlx::Row;
use std::path::Path;

use super::db::{path_key, RecordDb};

impl RecordDb {
    /// Modification time (Unix ms) recorded at the last successful check of `path`.
    pub async fn get_validated(&self, path: &Path) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            SELECT modified_ms FROM validate_records
            WHERE path = ?1
            "#,
        )
        .bind(path_key(path))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<i64, _>("modified_ms")))
    }

    /// Insert or replace the record for `path`.
    pub async fn put_validated(&self, path: &Path, modified_ms: i64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO validate_records (path, modified_ms)
            VALUES (?1, ?2)
            ON CONFLICT(path) DO UPDATE SET modified_ms = excluded.modified_ms
            "#,
        )
        .bind(path_key(path))
        .bind(modified_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Forget `path`. Deleting a missing record is not an error.
    pub async fn delete_validated(&self, path: &Path) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM validate_records
            WHERE path = ?1
            "#,
        )
        .bind(path_key(path))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
