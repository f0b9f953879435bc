//! Download scheduler.
//!
//! Turns one `download` call into at most two ladders (mirrored URL, then the
//! origin URL). Each ladder is one attempt: it waits in a LIFO pending stack
//! until one of `max_tasks` slots frees, then climbs Concurrent calls under a
//! retry budget and ends with at most one Serial call.
//!
//! State lives behind a single `std::sync::Mutex`. Critical sections never
//! await; strategies run in spawned tasks and report back through `finish`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::config::LadderConfig;
use crate::mirror::MirrorResolver;
use crate::transfer::{TransferRequest, TransferStatus, TransferStrategy};
use crate::validate::Validator;

/// Scheduler-assigned id of one attempt. Mirrored and origin attempts of the
/// same download get different ids.
pub type AttemptId = u64;

/// Scheduler limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Attempts allowed in flight at once.
    pub max_tasks: usize,
    /// Concurrent retries per attempt before the serial fallback.
    pub tries_per_chunk: u32,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_tasks: 20,
            tries_per_chunk: 3,
        }
    }
}

impl SchedulerSettings {
    pub fn from_config(cfg: &LadderConfig) -> Self {
        Self {
            max_tasks: cfg.max_tasks.max(1),
            tries_per_chunk: cfg.tries_per_chunk,
        }
    }
}

/// Snapshot of queue sizes for progress output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub in_flight: usize,
    pub pending: usize,
}

#[derive(Debug)]
struct Attempt {
    id: AttemptId,
    request: TransferRequest,
}

#[derive(Default)]
struct SchedulerState {
    /// Popped from the back: the newest attempt runs first.
    pending: Vec<Attempt>,
    running: HashSet<AttemptId>,
    waiters: HashMap<AttemptId, oneshot::Sender<TransferStatus>>,
    budgets: HashMap<AttemptId, u32>,
    closed: bool,
}

struct Shared {
    settings: SchedulerSettings,
    validator: Validator,
    mirror: Arc<dyn MirrorResolver>,
    concurrent: Arc<dyn TransferStrategy>,
    serial: Arc<dyn TransferStrategy>,
    next_id: AtomicU64,
    state: Mutex<SchedulerState>,
}

/// Handle to the scheduler. Clones share the same queue and limits.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn init(
        settings: SchedulerSettings,
        validator: Validator,
        mirror: Arc<dyn MirrorResolver>,
        concurrent: Arc<dyn TransferStrategy>,
        serial: Arc<dyn TransferStrategy>,
    ) -> Self {
        let settings = SchedulerSettings {
            max_tasks: settings.max_tasks.max(1),
            ..settings
        };
        Self {
            shared: Arc::new(Shared {
                settings,
                validator,
                mirror,
                concurrent,
                serial,
                next_id: AtomicU64::new(1),
                state: Mutex::new(SchedulerState::default()),
            }),
        }
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.shared.settings
    }

    /// Download `request`, trying its mirror first and the origin URL second.
    /// Never fails; the returned status is final.
    pub async fn download(&self, request: TransferRequest) -> TransferStatus {
        if request.is_noop() {
            return TransferStatus::Resolved;
        }
        if self.lock().closed {
            return TransferStatus::Fatal;
        }

        let mirrored = request.with_url(self.shared.mirror.resolve(&request.url));
        let status = self.run_ladder(mirrored).await;
        if status.is_resolved() {
            return status;
        }
        tracing::debug!(url = %request.url, "mirror ladder failed, trying origin");
        self.run_ladder(request).await
    }

    /// Queue sizes right now.
    pub fn status(&self) -> SchedulerStatus {
        let state = self.lock();
        SchedulerStatus {
            in_flight: state.running.len(),
            pending: state.pending.len(),
        }
    }

    /// Stop dispatching. Pending attempts settle `Fatal`, later downloads
    /// return `Fatal` at once, attempts already running finish normally.
    pub fn shutdown(&self) {
        let settled: Vec<oneshot::Sender<TransferStatus>> = {
            let mut state = self.lock();
            state.closed = true;
            let pending = std::mem::take(&mut state.pending);
            pending
                .into_iter()
                .filter_map(|attempt| {
                    state.budgets.remove(&attempt.id);
                    state.waiters.remove(&attempt.id)
                })
                .collect()
        };
        tracing::info!(dropped = settled.len(), "scheduler shut down");
        for waiter in settled {
            let _ = waiter.send(TransferStatus::Fatal);
        }
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// One attempt for `request`: skip if already valid, else queue and wait.
    async fn run_ladder(&self, request: TransferRequest) -> TransferStatus {
        if self
            .shared
            .validator
            .is_valid(&request.save_path, request.expected_hash())
            .await
        {
            return TransferStatus::Resolved;
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            if state.closed {
                return TransferStatus::Fatal;
            }
            let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(attempt = id, url = %request.url, "queued");
            state.waiters.insert(id, tx);
            state.budgets.insert(id, self.shared.settings.tries_per_chunk);
            state.pending.push(Attempt { id, request });
        }
        self.schedule();
        rx.await.unwrap_or(TransferStatus::Fatal)
    }

    /// Move pending attempts into free slots, newest first.
    fn schedule(&self) {
        let launch: Vec<Attempt> = {
            let mut state = self.lock();
            let mut launch = Vec::new();
            while !state.closed && state.running.len() < self.shared.settings.max_tasks {
                let Some(attempt) = state.pending.pop() else {
                    break;
                };
                state.running.insert(attempt.id);
                launch.push(attempt);
            }
            launch
        };
        for attempt in launch {
            let this = self.clone();
            tokio::spawn(async move { this.drive(attempt).await });
        }
    }

    /// Run an attempt to its terminal status and settle it. A panic inside a
    /// strategy counts as `Fatal`.
    async fn drive(self, attempt: Attempt) {
        let id = attempt.id;
        let this = self.clone();
        let status = match tokio::spawn(async move { this.climb(&attempt).await }).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(attempt = id, "attempt task failed: {}", e);
                TransferStatus::Fatal
            }
        };
        self.finish(id, status);
    }

    /// Concurrent calls while they ask for a retry and budget remains, then
    /// one serial call whose non-success is final.
    async fn climb(&self, attempt: &Attempt) -> TransferStatus {
        let request = &attempt.request;
        loop {
            match self.shared.concurrent.transfer(request, false).await {
                TransferStatus::Resolved => return TransferStatus::Resolved,
                TransferStatus::Retry if self.take_retry(attempt.id) => {
                    tracing::debug!(attempt = attempt.id, url = %request.url, "retrying concurrent");
                }
                status => {
                    tracing::debug!(attempt = attempt.id, url = %request.url, ?status, "falling back to serial");
                    break;
                }
            }
        }
        match self.shared.serial.transfer(request, false).await {
            TransferStatus::Resolved => TransferStatus::Resolved,
            status => {
                tracing::debug!(attempt = attempt.id, url = %request.url, ?status, "serial failed");
                TransferStatus::Fatal
            }
        }
    }

    /// Spend one unit of the attempt's budget; false once it is exhausted.
    fn take_retry(&self, id: AttemptId) -> bool {
        let mut state = self.lock();
        match state.budgets.get_mut(&id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }

    fn finish(&self, id: AttemptId, status: TransferStatus) {
        let waiter = {
            let mut state = self.lock();
            state.running.remove(&id);
            state.budgets.remove(&id);
            state.waiters.remove(&id)
        };
        tracing::debug!(attempt = id, ?status, "attempt finished");
        if let Some(waiter) = waiter {
            let _ = waiter.send(status);
        }
        self.schedule();
    }
}
