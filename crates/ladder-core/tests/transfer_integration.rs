//! Integration tests: real strategies against a local HTTP server.

mod common;

use common::http_server::{self, ServerOptions};
use ladder_core::storage::temp_path;
use ladder_core::transfer::{
    ConcurrentStrategy, CurlOptions, SerialStrategy, TransferContext, TransferRequest,
    TransferStatus, TransferStrategy,
};
use ladder_core::validate::Validator;
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[tokio::test]
async fn serial_fetch_writes_file_and_records_identifier() {
    let body = common::sample_body();
    let base = http_server::start(body.clone());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let ctx = common::context(validator.clone());
    let serial = SerialStrategy::new(ctx.clone());

    let dest = out.path().join("libraries/client.jar");
    let url = format!("{}client.jar", base);
    let req = TransferRequest::new(&url, &dest).with_hash(common::sha1_of(&body));

    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!temp_path(&dest).exists());
    assert!(validator.db().get_validated(&dest).await.unwrap().is_some());

    ctx.flush_records().await;
    let identifier = ladder_core::checksum::identifier_path(&dest).unwrap();
    let recorded = validator.db().resolve_url(&identifier).await.unwrap();
    assert_eq!(recorded.as_deref(), Some(url.as_str()));
}

#[tokio::test]
async fn concurrent_fetch_splits_into_ranges() {
    let body = common::sample_body();
    let base = http_server::start(body.clone());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let concurrent = ConcurrentStrategy::new(common::context(validator), 4, 1024);

    let dest = out.path().join("assets.bin");
    let req = TransferRequest::new(format!("{}assets.bin", base), &dest)
        .with_hash(common::sha1_of(&body));

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
    assert!(!temp_path(&dest).exists());
}

#[tokio::test]
async fn concurrent_fetch_without_ranges_uses_single_get() {
    let body = common::sample_body();
    let base = http_server::start_with_options(
        body.clone(),
        ServerOptions {
            support_ranges: false,
            advertise_ranges: false,
            ..ServerOptions::default()
        },
    );
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let concurrent = ConcurrentStrategy::new(common::context(validator), 4, 1024);

    let dest = out.path().join("plain.bin");
    let req = TransferRequest::new(format!("{}plain.bin", base), &dest);

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn server_ignoring_ranges_is_fatal_for_concurrent_only() {
    let body = common::sample_body();
    let base = http_server::start_with_options(
        body.clone(),
        ServerOptions {
            support_ranges: false,
            advertise_ranges: true,
            ..ServerOptions::default()
        },
    );
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let ctx = common::context(validator);
    let concurrent = ConcurrentStrategy::new(ctx.clone(), 4, 1024);
    let serial = SerialStrategy::new(ctx);

    let dest = out.path().join("liar.bin");
    let req = TransferRequest::new(format!("{}liar.bin", base), &dest);

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Fatal);
    assert!(!dest.exists());
    assert!(!temp_path(&dest).exists());

    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn hash_mismatch_asks_for_retry_and_removes_file() {
    let base = http_server::start(common::sample_body());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let ctx = common::context(validator.clone());
    let serial = SerialStrategy::new(ctx.clone());
    let concurrent = ConcurrentStrategy::new(ctx, 4, 1024);

    let dest = out.path().join("corrupt.jar");
    let req = TransferRequest::new(format!("{}corrupt.jar", base), &dest)
        .with_hash("0000000000000000000000000000000000000000");

    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Retry);
    assert!(!dest.exists());
    assert_eq!(validator.db().get_validated(&dest).await.unwrap(), None);

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Retry);
    assert!(!dest.exists());
}

#[tokio::test]
async fn skip_validate_accepts_any_content() {
    let body = common::sample_body();
    let base = http_server::start(body.clone());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), true).await;
    let serial = SerialStrategy::new(common::context(validator));

    let dest = out.path().join("trusted.jar");
    let req = TransferRequest::new(format!("{}trusted.jar", base), &dest)
        .with_hash("0000000000000000000000000000000000000000");

    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn not_found_is_fatal_for_concurrent_and_retry_for_serial() {
    let base = http_server::start(common::sample_body());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let ctx = common::context(validator);
    let concurrent = ConcurrentStrategy::new(ctx.clone(), 4, 1024);
    let serial = SerialStrategy::new(ctx);

    let dest = out.path().join("gone.jar");
    let req = TransferRequest::new(format!("{}missing/gone.jar", base), &dest);

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Fatal);
    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Retry);
    assert!(!dest.exists());
    assert!(!temp_path(&dest).exists());
}

#[tokio::test]
async fn unusable_url_is_fatal_for_both() {
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let ctx = common::context(validator);
    let concurrent = ConcurrentStrategy::new(ctx.clone(), 4, 1024);
    let serial = SerialStrategy::new(ctx);

    let req = TransferRequest::new("notaproto://host/file.jar", out.path().join("file.jar"));

    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Fatal);
    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Fatal);
}

#[tokio::test]
async fn already_valid_destination_skips_network() {
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let serial = SerialStrategy::new(common::context(validator));

    let dest = out.path().join("cached.jar");
    std::fs::write(&dest, b"hello\n").unwrap();
    // Nothing listens on port 1: any network use would fail.
    let req = TransferRequest::new("http://127.0.0.1:1/cached.jar", &dest)
        .with_hash("f572d396fae9206628714fb2ce00f72e94f2258f");

    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Resolved);
}

#[tokio::test]
async fn unbounded_serial_transfer_completes() {
    let body = common::sample_body();
    let base = http_server::start(body.clone());
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let serial = SerialStrategy::new(common::context(validator));

    let dest = out.path().join("launcher.bin");
    let req = TransferRequest::new(format!("{}launcher.bin", base), &dest);

    assert_eq!(serial.transfer(&req, true).await, TransferStatus::Resolved);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

fn stalling_server() -> String {
    http_server::start_with_options(
        common::sample_body(),
        ServerOptions {
            stall: true,
            ..ServerOptions::default()
        },
    )
}

fn short_timeout_context(validator: Validator) -> TransferContext {
    TransferContext::new(
        validator,
        CurlOptions {
            timeout: Some(Duration::from_millis(500)),
            ..CurlOptions::default()
        },
    )
}

#[tokio::test]
async fn serial_stall_is_retried_after_timeout() {
    let base = stalling_server();
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let serial = SerialStrategy::new(short_timeout_context(validator));

    let dest = out.path().join("stalled.jar");
    let req = TransferRequest::new(format!("{}stalled.jar", base), &dest);

    let started = Instant::now();
    assert_eq!(serial.transfer(&req, false).await, TransferStatus::Retry);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!dest.exists());
    assert!(!temp_path(&dest).exists());
}

#[tokio::test]
async fn concurrent_stall_is_retried_after_timeout() {
    let base = stalling_server();
    let state = tempdir().unwrap();
    let out = tempdir().unwrap();
    let validator = common::validator(state.path(), false).await;
    let concurrent = ConcurrentStrategy::new(short_timeout_context(validator), 4, 1024);

    let dest = out.path().join("stalled.bin");
    let req = TransferRequest::new(format!("{}stalled.bin", base), &dest);

    // HEAD stalls, then the fallback GET stalls too.
    let started = Instant::now();
    assert_eq!(concurrent.transfer(&req, false).await, TransferStatus::Retry);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!dest.exists());
}
