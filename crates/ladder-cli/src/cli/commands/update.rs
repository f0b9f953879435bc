//! `ladder update` – serial strategy with no time limit, for payloads that
//! must complete however slow the link is.

use anyhow::Result;
use ladder_core::transfer::{TransferRequest, TransferStatus, TransferStrategy};
use std::path::PathBuf;

use crate::cli::Engine;

pub async fn run_update(
    engine: &Engine,
    url: String,
    path: PathBuf,
    hash: Option<String>,
) -> Result<()> {
    let mut request = TransferRequest::new(url, path);
    request.expected_hash = hash;
    if request.is_noop() {
        anyhow::bail!("url and path must not be empty");
    }
    match engine.serial.transfer(&request, true).await {
        TransferStatus::Resolved => {
            println!("{}", request.save_path.display());
            Ok(())
        }
        other => anyhow::bail!("update from {} failed ({:?})", request.url, other),
    }
}
