//! HTTP HEAD probing.
//!
//! Uses the curl crate (libcurl) to learn `Content-Length` and whether the
//! server honours `Accept-Ranges: bytes`, which decides if the concurrent
//! strategy can split a file into ranges.

mod parse;

use std::str;

use crate::retry::TransferError;
use crate::transfer::CurlOptions;

/// Result of a HEAD request: the headers needed to plan a ranged download.
#[derive(Debug, Clone, Default)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

impl HeadResult {
    /// Size to split into ranges, if the server allows it and the file is at least `min_bytes`.
    pub fn splittable_len(&self, min_bytes: u64) -> Option<u64> {
        match self.content_length {
            Some(len) if self.accept_ranges && len > 0 && len >= min_bytes => Some(len),
            _ => None,
        }
    }
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows redirects; only the headers of the final response are parsed.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(url: &str, opts: &CurlOptions) -> Result<HeadResult, TransferError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.nobody(true)?; // HEAD request
    opts.apply(&mut easy)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                let line = s.trim_end();
                // A new status line starts a new response (redirect hop).
                if line.starts_with("HTTP/") {
                    headers.clear();
                }
                headers.push(line.to_string());
            }
            true
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }

    Ok(parse::parse_headers(&headers))
}
