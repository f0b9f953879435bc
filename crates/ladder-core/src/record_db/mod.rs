//! Persistent record store (SQLite via sqlx).
//!
//! Holds two small tables that outlive any single download:
//! - `validate_records`: path → modification time at last successful hash check
//! - `resolve_records`: content identifier → URL the content was fetched from

mod db;
mod resolved;
mod validated;

pub use db::RecordDb;

#[cfg(test)]
pub(crate) use db::open_memory;
