//! Fast strategy: HEAD, then parallel ranges when the server allows it.

use async_trait::async_trait;

use super::{fetch, TransferContext, TransferRequest, TransferStatus, TransferStrategy};
use crate::config::ConcurrentConfig;
use crate::fetch_head;
use crate::retry::ErrorKind;

/// Splits files of at least `min_split_bytes` into `segments` ranges; smaller
/// files, or servers without `Accept-Ranges: bytes`, get one GET.
pub struct ConcurrentStrategy {
    ctx: TransferContext,
    segments: usize,
    min_split_bytes: u64,
}

impl ConcurrentStrategy {
    pub fn new(ctx: TransferContext, segments: usize, min_split_bytes: u64) -> Self {
        Self {
            ctx,
            segments: segments.max(1),
            min_split_bytes,
        }
    }

    pub fn from_config(ctx: TransferContext, cfg: &ConcurrentConfig) -> Self {
        Self::new(ctx, cfg.segments, cfg.min_split_bytes)
    }

    /// Only transient network trouble is worth another concurrent call;
    /// everything else hands over to the serial strategy.
    pub fn judge(kind: ErrorKind) -> TransferStatus {
        if kind.is_transient() {
            TransferStatus::Retry
        } else {
            TransferStatus::Fatal
        }
    }
}

#[async_trait]
impl TransferStrategy for ConcurrentStrategy {
    fn name(&self) -> &'static str {
        "concurrent"
    }

    async fn transfer(&self, request: &TransferRequest, unbounded: bool) -> TransferStatus {
        let opts = self.ctx.curl(unbounded);
        let url = request.url.clone();
        let dest = request.save_path.clone();
        let segments = self.segments;
        let min_split_bytes = self.min_split_bytes;

        let job = move || {
            let total = match fetch_head::probe(&url, &opts) {
                Ok(head) => head.splittable_len(min_split_bytes),
                Err(e) => {
                    tracing::debug!(url, "HEAD failed, using a single GET: {}", e);
                    None
                }
            };
            match total {
                Some(total) if segments > 1 => {
                    fetch::fetch_ranges(&url, &dest, total, segments, &opts)
                }
                _ => fetch::fetch_single(&url, &dest, &opts),
            }
        };
        self.ctx.run(self.name(), request, job, Self::judge).await
    }
}
