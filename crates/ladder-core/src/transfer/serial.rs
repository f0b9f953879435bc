//! Patient fallback strategy: one plain GET.

use async_trait::async_trait;

use super::{fetch, TransferContext, TransferRequest, TransferStatus, TransferStrategy};
use crate::retry::ErrorKind;

pub struct SerialStrategy {
    ctx: TransferContext,
}

impl SerialStrategy {
    pub fn new(ctx: TransferContext) -> Self {
        Self { ctx }
    }

    /// Only an unusable URL or a failing disk is final; any network or HTTP
    /// failure may still clear up.
    pub fn judge(kind: ErrorKind) -> TransferStatus {
        match kind {
            ErrorKind::Malformed | ErrorKind::Storage => TransferStatus::Fatal,
            _ => TransferStatus::Retry,
        }
    }
}

#[async_trait]
impl TransferStrategy for SerialStrategy {
    fn name(&self) -> &'static str {
        "serial"
    }

    async fn transfer(&self, request: &TransferRequest, unbounded: bool) -> TransferStatus {
        let opts = self.ctx.curl(unbounded);
        let url = request.url.clone();
        let dest = request.save_path.clone();
        let job = move || fetch::fetch_single(&url, &dest, &opts);
        self.ctx.run(self.name(), request, job, Self::judge).await
    }
}
