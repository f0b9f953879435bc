//! Wiring of the core pieces from one loaded config.

use anyhow::Result;
use ladder_core::config::LadderConfig;
use ladder_core::mirror::MirrorTable;
use ladder_core::record_db::RecordDb;
use ladder_core::scheduler::{Scheduler, SchedulerSettings};
use ladder_core::transfer::{ConcurrentStrategy, SerialStrategy, TransferContext};
use ladder_core::validate::Validator;
use std::sync::Arc;

pub struct Engine {
    pub validator: Validator,
    pub scheduler: Scheduler,
    pub serial: Arc<SerialStrategy>,
    ctx: TransferContext,
}

impl Engine {
    pub async fn open(cfg: LadderConfig) -> Result<Self> {
        let db = RecordDb::open_default().await?;
        let validator = Validator::new(db, cfg.skip_validate);
        let ctx = TransferContext::from_config(validator.clone(), &cfg);
        let concurrent = Arc::new(ConcurrentStrategy::from_config(ctx.clone(), &cfg.concurrent));
        let serial = Arc::new(SerialStrategy::new(ctx.clone()));
        let mirror = MirrorTable::from_config(&cfg.mirror);
        if !mirror.is_empty() {
            tracing::debug!("mirror rewriting enabled");
        }
        let scheduler = Scheduler::init(
            SchedulerSettings::from_config(&cfg),
            validator.clone(),
            Arc::new(mirror),
            concurrent,
            serial.clone(),
        );
        Ok(Self {
            validator,
            scheduler,
            serial,
            ctx,
        })
    }

    /// Stop the scheduler and let pending record writes land.
    pub async fn close(&self) {
        self.scheduler.shutdown();
        self.ctx.flush_records().await;
    }

    /// Close the engine, then hand back a command's result.
    pub async fn finish(self, result: Result<()>) -> Result<()> {
        self.close().await;
        result
    }
}
