//! Transfer error type for retry classification.

/// Error returned by a single HTTP exchange or the write behind it.
/// Kept typed so strategies can classify before turning it into a status.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, bad URL, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer completed but fewer bytes arrived than announced
    /// (e.g. server closed early).
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// Server answered a range request with more bytes than the range
    /// (it ignored `Range`), so ranges cannot be combined.
    #[error("server ignored range request")]
    RangeIgnored,
    /// Local disk failure (disk full, permission denied, rename failed).
    #[error("storage: {0}")]
    Storage(#[source] std::io::Error),
}

impl TransferError {
    /// Wrap an `anyhow` storage failure, keeping the io error when there is one.
    pub(crate) fn storage(err: anyhow::Error) -> Self {
        let io_err = err
            .downcast::<std::io::Error>()
            .unwrap_or_else(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("{:#}", e)));
        TransferError::Storage(io_err)
    }
}
