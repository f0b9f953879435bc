//! CLI for the ladder download engine.

mod commands;
mod engine;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ladder_core::config;
use std::path::{Path, PathBuf};

use commands::{run_batch, run_checksum, run_fetch, run_lookup, run_update, run_verify};
use engine::Engine;

/// Top-level CLI for the ladder download engine.
#[derive(Debug, Parser)]
#[command(name = "ladder")]
#[command(about = "ladder: mirrored, retrying, validated downloads", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/ladder/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one file through the scheduler (mirror first, then origin).
    Fetch {
        /// Origin URL.
        url: String,
        /// Destination path.
        path: PathBuf,
        /// Expected SHA-1 (or SHA-256/SHA-512) hex digest.
        #[arg(long)]
        hash: Option<String>,
    },

    /// Download every entry of a JSON manifest: `[{"url", "path", "hash"?}, ...]`.
    Batch {
        /// Path to the manifest file.
        manifest: PathBuf,
    },

    /// Download a must-complete payload with the serial strategy and no time limit.
    Update {
        url: String,
        path: PathBuf,
        #[arg(long)]
        hash: Option<String>,
    },

    /// Check a file against an expected hash using the validation cache.
    Verify {
        path: PathBuf,
        hash: String,
    },

    /// Print SHA-1, SHA-256 and the content identifier of a file.
    Checksum {
        path: PathBuf,
    },

    /// Print the URL a content identifier was last fetched from.
    Lookup {
        identifier: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Checksum { path } => run_checksum(&path).await,
            CliCommand::Fetch { url, path, hash } => {
                let engine = Engine::open(cfg).await?;
                let result = run_fetch(&engine, url, path, hash).await;
                engine.finish(result).await
            }
            CliCommand::Batch { manifest } => {
                let engine = Engine::open(cfg).await?;
                let result = run_batch(&engine, Path::new(&manifest)).await;
                engine.finish(result).await
            }
            CliCommand::Update { url, path, hash } => {
                let engine = Engine::open(cfg).await?;
                let result = run_update(&engine, url, path, hash).await;
                engine.finish(result).await
            }
            CliCommand::Verify { path, hash } => {
                let engine = Engine::open(cfg).await?;
                let result = run_verify(&engine, &path, &hash).await;
                engine.finish(result).await
            }
            CliCommand::Lookup { identifier } => {
                let engine = Engine::open(cfg).await?;
                let result = run_lookup(&engine, &identifier).await;
                engine.finish(result).await
            }
        }
    }
}

#[cfg(test)]
mod tests;
