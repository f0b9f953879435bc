//! Transfer strategies: one attempt at putting a URL's body at a path.
//!
//! A strategy never raises; every outcome collapses into a [`TransferStatus`]
//! that tells the scheduler whether to stop, try again, or escalate.
//! [`ConcurrentStrategy`] splits large files into parallel ranges and gives up
//! quickly on anything but transient network trouble. [`SerialStrategy`] is
//! the patient fallback: one stream, and only a bad URL or a broken disk is
//! final.

mod concurrent;
mod fetch;
mod options;
mod pipeline;
mod serial;

use std::path::PathBuf;

use async_trait::async_trait;

pub use concurrent::ConcurrentStrategy;
pub use options::CurlOptions;
pub use pipeline::TransferContext;
pub use serial::SerialStrategy;

/// One download: where from, where to, and optionally what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub url: String,
    pub save_path: PathBuf,
    pub expected_hash: Option<String>,
}

impl TransferRequest {
    pub fn new(url: impl Into<String>, save_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            save_path: save_path.into(),
            expected_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(hash.into());
        self
    }

    /// Expected hash, if one is set and not blank.
    pub fn expected_hash(&self) -> Option<&str> {
        self.expected_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// A request with a blank URL or path has nothing to do.
    pub fn is_noop(&self) -> bool {
        self.url.trim().is_empty() || self.save_path.to_string_lossy().trim().is_empty()
    }

    /// Same destination and hash, different source.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self.clone()
        }
    }
}

/// Outcome of one strategy call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// File is in place (and verified when a hash was given).
    Resolved,
    /// Failed in a way another call might fix.
    Retry,
    /// This strategy cannot succeed for this request.
    Fatal,
}

impl TransferStatus {
    pub fn is_resolved(self) -> bool {
        self == TransferStatus::Resolved
    }
}

/// A way of performing one attempt.
#[async_trait]
pub trait TransferStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run one attempt. `unbounded` lifts every time limit.
    async fn transfer(&self, request: &TransferRequest, unbounded: bool) -> TransferStatus;
}
