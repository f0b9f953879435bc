//! `.part` file shared by every range of one transfer.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::temp_path;

/// Temp file next to its destination. Clones share the same handle, so range
/// workers on different threads can each write their own offsets.
#[derive(Clone)]
pub struct PartFile {
    file: Arc<File>,
    temp: PathBuf,
    dest: PathBuf,
}

impl PartFile {
    /// Create `<dest>.part`, truncating a leftover from an earlier attempt.
    pub fn create(dest: &Path) -> Result<Self> {
        let temp = temp_path(dest);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)
            .with_context(|| format!("create {}", temp.display()))?;
        Ok(Self {
            file: Arc::new(file),
            temp,
            dest: dest.to_path_buf(),
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Reserve `size` bytes up front so ranges land at their offsets.
    pub fn preallocate(&self, size: u64) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            let r = unsafe { libc::posix_fallocate(self.file.as_raw_fd(), 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, path = %self.temp.display(), "posix_fallocate failed, using set_len");
        }
        self.file
            .set_len(size)
            .with_context(|| format!("preallocate {}", self.temp.display()))
    }

    /// Write all of `data` at `offset` without moving any shared cursor.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        use std::os::unix::fs::FileExt;
        self.file
            .write_all_at(data, offset)
            .with_context(|| format!("write {} bytes at {}", data.len(), offset))
    }

    #[cfg(windows)]
    pub fn write_at(&self, mut offset: u64, mut data: &[u8]) -> Result<()> {
        use std::os::windows::fs::FileExt;
        while !data.is_empty() {
            let n = self
                .file
                .seek_write(data, offset)
                .with_context(|| format!("write {} bytes at {}", data.len(), offset))?;
            if n == 0 {
                anyhow::bail!("short write at {}", offset);
            }
            data = &data[n..];
            offset += n as u64;
        }
        Ok(())
    }

    /// Flush to disk and rename over the destination. The temp file is removed
    /// if either step fails.
    pub fn commit(self) -> Result<()> {
        if let Err(e) = self.file.sync_all() {
            self.discard();
            return Err(e).context("sync temp file");
        }
        let Self { file, temp, dest } = self;
        drop(file);
        if let Err(e) = std::fs::rename(&temp, &dest) {
            remove_quietly(&temp);
            return Err(e)
                .with_context(|| format!("rename {} to {}", temp.display(), dest.display()));
        }
        Ok(())
    }

    /// Close and delete the temp file after a failed transfer.
    pub fn discard(self) {
        let Self { file, temp, .. } = self;
        drop(file);
        remove_quietly(&temp);
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), "could not remove temp file: {}", e);
        }
    }
}
