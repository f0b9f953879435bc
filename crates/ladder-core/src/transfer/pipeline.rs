//! The steps every strategy shares around its network fetch.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use super::{CurlOptions, TransferRequest, TransferStatus};
use crate::checksum;
use crate::config::LadderConfig;
use crate::retry::{classify, ErrorKind, TransferError};
use crate::validate::Validator;

/// Count of identifier tasks still running, so short-lived callers can wait
/// for them before exiting.
#[derive(Default)]
struct Bookkeeping {
    outstanding: AtomicUsize,
    idle: Notify,
}

/// Decrements the outstanding count when an identifier task ends, panics included.
struct BookkeepingGuard(Arc<Bookkeeping>);

impl Drop for BookkeepingGuard {
    fn drop(&mut self) {
        if self.0.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// What a strategy needs besides its own fetch logic: the validator (and
/// through it the record store) and the curl settings.
#[derive(Clone)]
pub struct TransferContext {
    validator: Validator,
    curl: CurlOptions,
    bookkeeping: Arc<Bookkeeping>,
}

impl TransferContext {
    pub fn new(validator: Validator, curl: CurlOptions) -> Self {
        Self {
            validator,
            curl,
            bookkeeping: Arc::default(),
        }
    }

    pub fn from_config(validator: Validator, cfg: &LadderConfig) -> Self {
        Self::new(validator, CurlOptions::from_config(cfg))
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub(crate) fn curl(&self, unbounded: bool) -> CurlOptions {
        self.curl.for_call(unbounded)
    }

    /// Wait until every background identifier task has finished.
    pub async fn flush_records(&self) {
        loop {
            let idle = self.bookkeeping.idle.notified();
            if self.bookkeeping.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Run one attempt:
    ///
    /// 1. an already-valid destination resolves without network,
    /// 2. the parent directory is created (failure is fatal),
    /// 3. `fetch` runs on the blocking pool and its error is mapped by `judge`,
    /// 4. the result is verified against the expected hash unless validation is
    ///    skipped; a mismatch removes the file and asks for a retry,
    /// 5. the content identifier is recorded in the background.
    pub(crate) async fn run<F>(
        &self,
        strategy: &'static str,
        request: &TransferRequest,
        fetch: F,
        judge: fn(ErrorKind) -> TransferStatus,
    ) -> TransferStatus
    where
        F: FnOnce() -> Result<u64, TransferError> + Send + 'static,
    {
        let path = request.save_path.as_path();
        let expected = request.expected_hash();

        if self.validator.is_valid(path, expected).await {
            tracing::debug!(strategy, path = %path.display(), "already valid");
            return TransferStatus::Resolved;
        }

        if let Err(e) = ensure_parent(path).await {
            tracing::warn!(strategy, path = %path.display(), "cannot create parent directory: {}", e);
            return TransferStatus::Fatal;
        }

        let written = match tokio::task::spawn_blocking(fetch).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                let kind = classify(&e);
                let status = judge(kind);
                tracing::debug!(strategy, url = %request.url, ?kind, ?status, "transfer failed: {}", e);
                return status;
            }
            Err(e) => {
                tracing::warn!(strategy, url = %request.url, "transfer task join: {}", e);
                return TransferStatus::Fatal;
            }
        };

        if let Some(expected) = expected.filter(|_| !self.validator.skip_validate()) {
            if !self.validator.hash_matches(path, expected).await {
                tracing::warn!(strategy, url = %request.url, path = %path.display(), "downloaded file does not match expected hash");
                self.validator.forget(path).await;
                if let Err(e) = tokio::fs::remove_file(path).await {
                    tracing::debug!(path = %path.display(), "could not remove mismatched file: {}", e);
                }
                return TransferStatus::Retry;
            }
            self.validator.record_verified(path).await;
        }

        self.record_identifier(request);
        tracing::debug!(strategy, url = %request.url, bytes = written, "transfer resolved");
        TransferStatus::Resolved
    }

    /// Hash the finished file and store `identifier -> url`, off the attempt's
    /// critical path. Failures are only logged.
    fn record_identifier(&self, request: &TransferRequest) {
        let db = self.validator.db().clone();
        let path = request.save_path.clone();
        let url = request.url.clone();
        self.bookkeeping.outstanding.fetch_add(1, Ordering::AcqRel);
        let guard = BookkeepingGuard(Arc::clone(&self.bookkeeping));
        tokio::spawn(async move {
            let _guard = guard;
            let hashed = {
                let path = path.clone();
                tokio::task::spawn_blocking(move || checksum::identifier_path(&path)).await
            };
            let identifier = match hashed {
                Ok(Ok(id)) => id,
                Ok(Err(e)) => {
                    tracing::warn!(path = %path.display(), "identifier hashing failed: {:#}", e);
                    return;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "identifier task join: {}", e);
                    return;
                }
            };
            if let Err(e) = db.add_resolve_record(&identifier, &url).await {
                tracing::warn!(url, "resolve record write failed: {:#}", e);
            }
        });
    }
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
