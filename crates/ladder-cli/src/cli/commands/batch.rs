//! `ladder batch` – submit every manifest entry at once and report progress.

use anyhow::{Context, Result};
use ladder_core::transfer::{TransferRequest, TransferStatus};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Engine;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// One manifest entry.
#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub url: String,
    pub path: PathBuf,
    #[serde(default)]
    pub hash: Option<String>,
}

impl From<ManifestEntry> for TransferRequest {
    fn from(entry: ManifestEntry) -> Self {
        TransferRequest {
            url: entry.url,
            save_path: entry.path,
            expected_hash: entry.hash,
        }
    }
}

pub fn parse_manifest(data: &str) -> Result<Vec<ManifestEntry>> {
    serde_json::from_str(data).context("manifest must be a JSON array of {url, path, hash?}")
}

/// Read and parse the manifest at `manifest`.
pub async fn read_manifest(manifest: &Path) -> Result<Vec<ManifestEntry>> {
    let data = tokio::task::spawn_blocking({
        let manifest = manifest.to_path_buf();
        move || std::fs::read_to_string(&manifest)
    })
    .await?
    .with_context(|| format!("read manifest {}", manifest.display()))?;
    parse_manifest(&data)
}

pub async fn run_batch(engine: &Engine, manifest: &Path) -> Result<()> {
    let entries = read_manifest(manifest).await?;
    let total = entries.len();
    tracing::info!(total, manifest = %manifest.display(), "batch started");

    let mut join_set = tokio::task::JoinSet::new();
    for entry in entries {
        let scheduler = engine.scheduler.clone();
        let request = TransferRequest::from(entry);
        join_set.spawn(async move {
            let url = request.url.clone();
            (url, scheduler.download(request).await)
        });
    }

    let progress = {
        let scheduler = engine.scheduler.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
            loop {
                ticker.tick().await;
                let status = scheduler.status();
                println!(
                    "  {} in flight, {} pending",
                    status.in_flight, status.pending
                );
            }
        })
    };

    let mut failed = Vec::new();
    while let Some(res) = join_set.join_next().await {
        let (url, status) = res.map_err(|e| anyhow::anyhow!("download task join: {}", e))?;
        if status == TransferStatus::Fatal {
            failed.push(url);
        }
    }
    progress.abort();

    println!("{} of {} downloads resolved", total - failed.len(), total);
    if !failed.is_empty() {
        for url in &failed {
            eprintln!("  failed: {}", url);
        }
        anyhow::bail!("{} download(s) failed", failed.len());
    }
    Ok(())
}
