/// High-level classification of a transfer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect, stall, or overall deadline).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, TLS handshake, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Body shorter than announced.
    Partial,
    /// URL cannot be used at all (malformed, unsupported scheme).
    Malformed,
    /// Local disk failure.
    Storage,
    /// Anything else, including 4xx responses.
    Other,
}

impl ErrorKind {
    /// Kinds that a fresh attempt on the same URL can plausibly fix.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout
                | ErrorKind::Throttled
                | ErrorKind::Connection
                | ErrorKind::Http5xx(_)
                | ErrorKind::Partial
        )
    }
}
