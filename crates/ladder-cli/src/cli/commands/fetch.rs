//! `ladder fetch` – one download through the scheduler.

use anyhow::Result;
use ladder_core::transfer::{TransferRequest, TransferStatus};
use std::path::PathBuf;

use crate::cli::Engine;

pub async fn run_fetch(
    engine: &Engine,
    url: String,
    path: PathBuf,
    hash: Option<String>,
) -> Result<()> {
    let mut request = TransferRequest::new(url, path);
    request.expected_hash = hash;
    let status = engine.scheduler.download(request.clone()).await;
    match status {
        TransferStatus::Resolved => {
            println!("{}", request.save_path.display());
            Ok(())
        }
        other => anyhow::bail!("download of {} failed ({:?})", request.url, other),
    }
}
