//! `ladder verify` – run the integrity validator on one file.

use anyhow::Result;
use std::path::Path;

use crate::cli::Engine;

pub async fn run_verify(engine: &Engine, path: &Path, hash: &str) -> Result<()> {
    if engine.validator.is_valid(path, Some(hash)).await {
        println!("ok  {}", path.display());
        Ok(())
    } else {
        anyhow::bail!("{} is missing or does not match {}", path.display(), hash)
    }
}
