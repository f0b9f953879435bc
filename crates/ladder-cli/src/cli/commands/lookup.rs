//! `ladder lookup` – URL recorded for a content identifier.

use anyhow::Result;

use crate::cli::Engine;

pub async fn run_lookup(engine: &Engine, identifier: &str) -> Result<()> {
    match engine.validator.db().resolve_url(identifier.trim()).await? {
        Some(url) => {
            println!("{}", url);
            Ok(())
        }
        None => anyhow::bail!("no record for {}", identifier),
    }
}
