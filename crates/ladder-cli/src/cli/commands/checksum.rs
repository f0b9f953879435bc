//! `ladder checksum` – print the digests ladder uses for a file.

use anyhow::Result;
use ladder_core::checksum;
use std::path::Path;

pub async fn run_checksum(path: &Path) -> Result<()> {
    let owned = path.to_path_buf();
    let (sha1, sha256, identifier) = tokio::task::spawn_blocking(move || -> Result<_> {
        Ok((
            checksum::sha1_path(&owned)?,
            checksum::sha256_path(&owned)?,
            checksum::identifier_path(&owned)?,
        ))
    })
    .await??;
    println!("sha1        {}", sha1);
    println!("sha256      {}", sha256);
    println!("identifier  {}", identifier);
    Ok(())
}
