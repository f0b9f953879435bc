//! Disk side of a transfer.
//!
//! Bodies are written into `<save_path>.part` and only renamed over the
//! destination once complete, so a failed attempt never leaves a truncated
//! file where the validator would look.

mod part;

pub use part::PartFile;

/// Suffix of in-progress files.
pub const TEMP_SUFFIX: &str = ".part";

/// `client.jar` → `client.jar.part`.
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
