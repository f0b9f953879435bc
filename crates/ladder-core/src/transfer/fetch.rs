//! Blocking GETs into a `.part` file, single stream or split into ranges.
//!
//! Both entry points end the same way: on success the temp file is synced and
//! renamed over the destination, on failure it is removed.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use curl::easy::Easy;

use super::CurlOptions;
use crate::retry::TransferError;
use crate::segmenter::{plan_segments, Segment};
use crate::storage::PartFile;

/// Slot the write callback fills when the disk, not the network, failed.
#[derive(Clone, Default)]
struct StorageFault(Arc<Mutex<Option<std::io::Error>>>);

impl StorageFault {
    fn set(&self, err: anyhow::Error) {
        let io_err = err
            .downcast::<std::io::Error>()
            .unwrap_or_else(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        if let Ok(mut slot) = self.0.lock() {
            slot.replace(io_err);
        }
    }

    fn take(&self) -> Option<std::io::Error> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Turn a failed `perform` into the most specific error: a storage fault
/// recorded by the write callback wins over curl's generic write error.
fn perform_error(e: curl::Error, fault: &StorageFault) -> TransferError {
    if e.is_write_error() {
        if let Some(io_err) = fault.take() {
            return TransferError::Storage(io_err);
        }
    }
    TransferError::Curl(e)
}

fn check_status(easy: &mut Easy) -> Result<(), TransferError> {
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    Ok(())
}

/// Commit on success, remove the temp file on failure.
fn settle(part: PartFile, result: Result<u64, TransferError>) -> Result<u64, TransferError> {
    match result {
        Ok(written) => {
            part.commit().map_err(TransferError::storage)?;
            Ok(written)
        }
        Err(e) => {
            part.discard();
            Err(e)
        }
    }
}

/// GET `url` in one stream into `final_path`. Returns bytes written.
pub(crate) fn fetch_single(
    url: &str,
    final_path: &Path,
    opts: &CurlOptions,
) -> Result<u64, TransferError> {
    let part = PartFile::create(final_path).map_err(TransferError::storage)?;
    let result = stream_body(url, &part, opts);
    settle(part, result)
}

fn stream_body(url: &str, part: &PartFile, opts: &CurlOptions) -> Result<u64, TransferError> {
    let offset = Arc::new(AtomicU64::new(0));
    let offset_cb = Arc::clone(&offset);
    let fault = StorageFault::default();
    let fault_cb = fault.clone();
    let part = part.clone();

    let mut easy = Easy::new();
    easy.url(url)?;
    opts.apply(&mut easy)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            let off = offset_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
            match part.write_at(off, data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    fault_cb.set(e);
                    Ok(0)
                }
            }
        })?;
        transfer.perform().map_err(|e| perform_error(e, &fault))?;
    }

    check_status(&mut easy)?;
    Ok(offset.load(Ordering::Relaxed))
}

/// GET `url` as `segments` parallel byte ranges of a `total`-byte body.
/// Each range runs on its own thread and curl handle.
pub(crate) fn fetch_ranges(
    url: &str,
    final_path: &Path,
    total: u64,
    segments: usize,
    opts: &CurlOptions,
) -> Result<u64, TransferError> {
    let part = PartFile::create(final_path).map_err(TransferError::storage)?;
    if let Err(e) = part.preallocate(total) {
        part.discard();
        return Err(TransferError::storage(e));
    }

    let plan = plan_segments(total, segments);
    tracing::debug!(url, total, ranges = plan.len(), "ranged fetch");

    let shared = &part;
    let result = std::thread::scope(|scope| {
        let handles: Vec<_> = plan
            .iter()
            .map(|segment| scope.spawn(move || fetch_range(url, segment, shared, opts)))
            .collect();
        let mut first_err = None;
        for handle in handles {
            let outcome = handle.join().unwrap_or_else(|_| {
                Err(TransferError::Storage(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "range worker panicked",
                )))
            });
            if let Err(e) = outcome {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(total),
        }
    });
    settle(part, result)
}

/// Fetch one range and write it at its offset.
fn fetch_range(
    url: &str,
    segment: &Segment,
    part: &PartFile,
    opts: &CurlOptions,
) -> Result<(), TransferError> {
    let received = Arc::new(AtomicU64::new(0));
    let received_cb = Arc::clone(&received);
    let overflow = Arc::new(AtomicBool::new(false));
    let overflow_cb = Arc::clone(&overflow);
    let fault = StorageFault::default();
    let fault_cb = fault.clone();
    let start = segment.start;
    let len = segment.len();
    let part = part.clone();

    let mut easy = Easy::new();
    easy.url(url)?;
    opts.apply(&mut easy)?;
    easy.range(&segment.curl_range())?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(move |data| {
            let off = received_cb.fetch_add(data.len() as u64, Ordering::Relaxed);
            // Never write past the range into a neighbour's bytes.
            if off + data.len() as u64 > len {
                overflow_cb.store(true, Ordering::Relaxed);
                return Ok(0);
            }
            match part.write_at(start + off, data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    fault_cb.set(e);
                    Ok(0)
                }
            }
        })?;
        if let Err(e) = transfer.perform() {
            if overflow.load(Ordering::Relaxed) {
                return Err(TransferError::RangeIgnored);
            }
            return Err(perform_error(e, &fault));
        }
    }

    check_status(&mut easy)?;
    let received = received.load(Ordering::Relaxed);
    if received != len {
        return Err(TransferError::PartialTransfer {
            expected: len,
            received,
        });
    }
    Ok(())
}
