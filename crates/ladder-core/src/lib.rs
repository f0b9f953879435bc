pub mod config;
pub mod logging;

pub mod checksum;
pub mod fetch_head;
pub mod mirror;
pub mod record_db;
pub mod retry;
pub mod scheduler;
pub mod segmenter;
pub mod storage;
pub mod transfer;
pub mod validate;

pub use mirror::{MirrorResolver, MirrorTable, NoMirror};
pub use record_db::RecordDb;
pub use scheduler::{Scheduler, SchedulerSettings, SchedulerStatus};
pub use transfer::{
    ConcurrentStrategy, CurlOptions, SerialStrategy, TransferContext, TransferRequest,
    TransferStatus, TransferStrategy,
};
pub use validate::Validator;
