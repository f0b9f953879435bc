#![allow(dead_code)]

pub mod http_server;

use std::path::Path;

use ladder_core::record_db::RecordDb;
use ladder_core::transfer::{CurlOptions, TransferContext};
use ladder_core::validate::Validator;

/// Body large enough to be split into several ranges.
pub fn sample_body() -> Vec<u8> {
    (0u8..100).cycle().take(64 * 1024).collect()
}

/// SHA-1 of `body`, computed through a scratch file.
pub fn sha1_of(body: &[u8]) -> String {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("body");
    std::fs::write(&path, body).unwrap();
    ladder_core::checksum::sha1_path(&path).unwrap()
}

pub async fn validator(state_dir: &Path, skip_validate: bool) -> Validator {
    let db = RecordDb::open_at(state_dir.join("records.db")).await.unwrap();
    Validator::new(db, skip_validate)
}

pub fn context(validator: Validator) -> TransferContext {
    TransferContext::new(
        validator,
        CurlOptions {
            timeout: Some(std::time::Duration::from_secs(5)),
            ..CurlOptions::default()
        },
    )
}
