use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Parallel-range tuning for the concurrent transfer strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrentConfig {
    /// Number of byte ranges fetched in parallel for one file.
    pub segments: usize,
    /// Files smaller than this are fetched with a single GET.
    pub min_split_bytes: u64,
}

impl Default for ConcurrentConfig {
    fn default() -> Self {
        Self {
            segments: 4,
            min_split_bytes: 1024 * 1024,
        }
    }
}

/// One prefix rewrite: URLs starting with `origin` are fetched from `mirror` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub origin: String,
    pub mirror: String,
}

/// Mirror rewriting section (`[mirror]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub enabled: bool,
    pub rules: Vec<MirrorRule>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

/// Global configuration loaded from `~/.config/ladder/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// Maximum number of attempts in flight at once.
    pub max_tasks: usize,
    /// Concurrent-strategy retries per attempt before falling back to the serial strategy.
    pub tries_per_chunk: u32,
    /// Per-attempt network timeout in milliseconds.
    pub timeout_ms: u64,
    /// Trust downloaded files without comparing hashes.
    pub skip_validate: bool,
    /// Optional `host:port` HTTP proxy used by every transfer.
    pub global_proxy: Option<String>,
    /// Optional receive cap in bytes per second for each curl handle.
    pub max_bytes_per_sec: Option<u64>,
    pub concurrent: ConcurrentConfig,
    pub mirror: MirrorConfig,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            max_tasks: 20,
            tries_per_chunk: 3,
            timeout_ms: 3000,
            skip_validate: false,
            global_proxy: None,
            max_bytes_per_sec: None,
            concurrent: ConcurrentConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

/// Rejected `global_proxy` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    #[error("proxy must be host:port, got {0:?}")]
    Format(String),
    #[error("invalid proxy host {0:?}")]
    Host(String),
    #[error("invalid proxy port {0:?}")]
    Port(String),
}

/// Validate a `host:port` proxy string. Hosts may contain ASCII letters,
/// digits, `-` and `.`.
pub fn parse_proxy(raw: &str) -> std::result::Result<(String, u16), ProxyError> {
    let raw = raw.trim();
    let (host, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| ProxyError::Format(raw.to_string()))?;
    let host = host.trim();
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        return Err(ProxyError::Host(host.to_string()));
    }
    let port: u16 = port
        .trim()
        .parse()
        .map_err(|_| ProxyError::Port(port.to_string()))?;
    Ok((host.to_string(), port))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ladder")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LadderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = LadderConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from_path(&path)
}

/// Load configuration from an explicit file; missing keys take their defaults.
pub fn load_from_path(path: &Path) -> Result<LadderConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: LadderConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
