//! File digests used for integrity checks and content identifiers.
//!
//! All functions read in fixed-size chunks so large archives never sit in memory.
//! They block; async callers go through `spawn_blocking`.

use anyhow::{Context, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Digest algorithm implied by the length of an expected hex hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// 64 hex chars select SHA-256, 128 select SHA-512; anything else is treated
    /// as SHA-1, the algorithm game manifests publish.
    pub fn for_expected(expected: &str) -> Self {
        match expected.trim().len() {
            64 => HashAlgorithm::Sha256,
            128 => HashAlgorithm::Sha512,
            _ => HashAlgorithm::Sha1,
        }
    }
}

fn feed<D: Digest>(path: &Path, mut hasher: D) -> Result<D> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher)
}

/// Compute SHA-1 of a file as lowercase hex.
pub fn sha1_path(path: &Path) -> Result<String> {
    Ok(hex::encode(feed(path, Sha1::new())?.finalize()))
}

/// Compute SHA-256 of a file as lowercase hex.
pub fn sha256_path(path: &Path) -> Result<String> {
    Ok(hex::encode(feed(path, Sha256::new())?.finalize()))
}

/// Compute the digest of `path` with `algorithm`.
pub fn digest_path(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Sha1 => sha1_path(path),
        HashAlgorithm::Sha256 => sha256_path(path),
        HashAlgorithm::Sha512 => Ok(hex::encode(feed(path, Sha512::new())?.finalize())),
    }
}

/// Hash `path` and compare with `expected` (hex, case-insensitive).
pub fn matches_path(path: &Path, expected: &str) -> Result<bool> {
    let expected = expected.trim();
    let actual = digest_path(path, HashAlgorithm::for_expected(expected))?;
    Ok(actual.eq_ignore_ascii_case(expected))
}

/// Content identifier of a file: `sha512hex-sha256hex`, computed in one pass.
pub fn identifier_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut long = Sha512::new();
    let mut short = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        long.update(&buf[..n]);
        short.update(&buf[..n]);
    }
    Ok(format!(
        "{}-{}",
        hex::encode(long.finalize()),
        hex::encode(short.finalize())
    ))
}
