//! Failure classification for transfers.
//!
//! Maps curl errors, HTTP statuses and local storage failures onto a small set
//! of kinds, and each transfer strategy decides which kinds are worth another
//! attempt (`Retry`) and which make the strategy pointless (`Fatal`).

mod classify;
mod error;
mod kind;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::TransferError;
pub use kind::ErrorKind;
