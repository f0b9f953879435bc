//! Logging init: append to a file under the XDG state dir, or fall back to stderr.
//!
//! `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,ladder_core=debug,ladder=debug";

/// One log line's destination. Stderr is used when the log file handle
/// cannot be duplicated.
enum LineWriter {
    File(File),
    Stderr,
}

impl io::Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LineWriter::File(f) => f.write(buf),
            LineWriter::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LineWriter::File(f) => f.flush(),
            LineWriter::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct LogFile(File);

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LineWriter::File(f),
            Err(_) => LineWriter::Stderr,
        }
    }
}

fn install(writer: BoxMakeWriter) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))
}

/// `~/.local/state/ladder/ladder.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ladder")?;
    Ok(xdg_dirs.get_state_home().join("ladder.log"))
}

/// Log to the default file. Returns Err when the file cannot be opened so the
/// caller can use [`init_logging_stderr`] instead.
pub fn init_logging() -> Result<()> {
    init_logging_at(&log_file_path()?)
}

/// Log to `path`, creating parent directories.
pub fn init_logging_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    install(BoxMakeWriter::new(LogFile(file)))?;
    tracing::info!("ladder logging to {}", path.display());
    Ok(())
}

/// Log to stderr only. Never fails; a second subscriber is silently ignored.
pub fn init_logging_stderr() {
    let _ = install(BoxMakeWriter::new(io::stderr));
}
