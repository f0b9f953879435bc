//! CLI command handlers, one per file.

mod batch;
mod checksum;
mod fetch;
mod lookup;
mod update;
mod verify;

pub use batch::run_batch;
pub use checksum::run_checksum;
pub use fetch::run_fetch;
pub use lookup::run_lookup;
pub use update::run_update;
pub use verify::run_verify;
