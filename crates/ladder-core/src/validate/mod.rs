//! Integrity validator with an mtime-keyed validation cache.
//!
//! `is_valid` answers "is the file at this path already what we want?" and is
//! consulted before any network work. A file whose modification time is not
//! newer than the one recorded at its last successful hash check is trusted
//! without re-hashing.

use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::checksum;
use crate::record_db::RecordDb;

/// Modification time of `path` in Unix milliseconds.
pub async fn modified_millis(path: &Path) -> std::io::Result<i64> {
    let modified = tokio::fs::metadata(path).await?.modified()?;
    let ms = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    Ok(ms as i64)
}

/// Checks files against expected hashes, consulting and updating the validation cache.
#[derive(Clone)]
pub struct Validator {
    db: RecordDb,
    skip_validate: bool,
}

impl Validator {
    pub fn new(db: RecordDb, skip_validate: bool) -> Self {
        Self { db, skip_validate }
    }

    pub fn db(&self) -> &RecordDb {
        &self.db
    }

    pub fn skip_validate(&self) -> bool {
        self.skip_validate
    }

    /// True if `path` exists and matches `expected` (or no hash is expected).
    ///
    /// Never fails: store and I/O errors are logged and count as "not valid".
    pub async fn is_valid(&self, path: &Path, expected: Option<&str>) -> bool {
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                self.forget(path).await;
                return false;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot stat file: {}", e);
                return false;
            }
        }

        let Some(expected) = expected.map(str::trim).filter(|h| !h.is_empty()) else {
            return true;
        };
        if self.skip_validate {
            return true;
        }

        let modified = match modified_millis(path).await {
            Ok(ms) => ms,
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read mtime: {}", e);
                return false;
            }
        };
        match self.db.get_validated(path).await {
            Ok(Some(last)) if modified <= last => {
                tracing::trace!(path = %path.display(), "validation cache hit");
                return true;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(path = %path.display(), "validation cache read failed: {:#}", e),
        }

        if self.hash_matches(path, expected).await {
            self.remember(path, modified).await;
            true
        } else {
            tracing::debug!(path = %path.display(), "hash mismatch");
            self.forget(path).await;
            false
        }
    }

    /// Hash `path` on the blocking pool and compare with `expected`.
    pub(crate) async fn hash_matches(&self, path: &Path, expected: &str) -> bool {
        let owned = path.to_path_buf();
        let expected = expected.to_string();
        let res =
            tokio::task::spawn_blocking(move || checksum::matches_path(&owned, &expected)).await;
        match res {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), "hashing failed: {:#}", e);
                false
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "hash task join: {}", e);
                false
            }
        }
    }

    /// Record a successful verification of `path` at its current mtime.
    pub(crate) async fn record_verified(&self, path: &Path) {
        match modified_millis(path).await {
            Ok(ms) => self.remember(path, ms).await,
            Err(e) => tracing::warn!(path = %path.display(), "cannot read mtime: {}", e),
        }
    }

    async fn remember(&self, path: &Path, modified_ms: i64) {
        if let Err(e) = self.db.put_validated(path, modified_ms).await {
            tracing::warn!(path = %path.display(), "validation cache write failed: {:#}", e);
        }
    }

    /// Drop any cache record for `path`.
    pub(crate) async fn forget(&self, path: &Path) {
        if let Err(e) = self.db.delete_validated(path).await {
            tracing::warn!(path = %path.display(), "validation cache delete failed: {:#}", e);
        }
    }
}
