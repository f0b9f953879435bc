//! Resolve records: which URL produced a given piece of content.

use anyhow::Result;
use sqlx::Row;

use super::db::RecordDb;

impl RecordDb {
    /// Remember that content with `identifier` was fetched from `url`.
    /// A later fetch of the same content overwrites the URL.
    pub async fn add_resolve_record(&self, identifier: &str, url: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resolve_records (identifier, url)
            VALUES (?1, ?2)
            ON CONFLICT(identifier) DO UPDATE SET url = excluded.url
            "#,
        )
        .bind(identifier)
        .bind(url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// URL recorded for `identifier`, if any.
    pub async fn resolve_url(&self, identifier: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT url FROM resolve_records
            WHERE identifier = ?1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get::<String, _>("url")))
    }
}
