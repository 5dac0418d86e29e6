#![cfg(feature = "lastmod")]

//! Integration tests for the last-modified helper

use crate::integration::mock_server::MockServerFixture;
use async_trait::async_trait;
use bytes::Bytes;
use httpbulk::{
    fetch_last_modified, fetch_last_modified_with_policy, Error, Executor, ExecutorOptions,
    FailurePolicy, Response, Sender,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const HTTP_DATE: &str = "Sun, 06 Nov 1994 08:49:37 GMT";

/// Answers `/broken` with an immediate 500 and everything else after a
/// minute, counting sends that were dropped before they finished.
#[derive(Default)]
struct SlowTailSender {
    completed: AtomicUsize,
    abandoned: AtomicUsize,
}

struct PendingSend<'a> {
    sender: &'a SlowTailSender,
    finished: bool,
}

impl Drop for PendingSend<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.sender.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Sender for SlowTailSender {
    async fn send(&self, request: reqwest::Request) -> httpbulk::Result<Response> {
        let status = if request.url().path() == "/broken" {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            let mut pending = PendingSend {
                sender: self,
                finished: false,
            };
            tokio::time::sleep(Duration::from_secs(60)).await;
            pending.finished = true;
            self.completed.fetch_add(1, Ordering::SeqCst);
            StatusCode::OK
        };

        let mut headers = HeaderMap::new();
        headers.insert("last-modified", HeaderValue::from_static(HTTP_DATE));
        Ok(Response::from_bytes(
            status,
            headers,
            request.url().clone(),
            Bytes::new(),
        ))
    }
}

async fn fail_fast_with(policy: FailurePolicy) -> Arc<SlowTailSender> {
    let sender = Arc::new(SlowTailSender::default());
    let executor = Executor::new(
        ExecutorOptions::new()
            .with_concurrency_limit(10)
            .with_sender(sender.clone() as Arc<dyn httpbulk::Sender>),
    );

    let result = fetch_last_modified_with_policy(
        &executor,
        &CancellationToken::new(),
        None,
        ["http://tail.test/broken", "http://tail.test/slow"],
        policy,
    )
    .await;
    assert!(matches!(result, Err(Error::RequestFailed { status: 500, .. })));

    // Wait for the slow task to settle one way or the other.
    while executor.inflight().unwrap().in_use > 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    sender
}

#[tokio::test]
async fn test_last_modified_in_input_order() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture.mock_last_modified("/a", 200, HTTP_DATE).await;
    let _b = fixture
        .mock_last_modified("/b", 304, "Tue, 15 Nov 1994 12:45:26 GMT")
        .await;
    let _gone = fixture.mock_status("GET", "/gone", 404).await;

    let executor = fixture.executor(2);
    let times = fetch_last_modified(
        &executor,
        &CancellationToken::new(),
        None,
        [fixture.url("/a"), fixture.url("/b"), fixture.url("/gone")],
    )
    .await
    .unwrap();

    assert_eq!(times.len(), 3);
    assert_eq!(times[0].timestamp(), 784111777);
    assert_eq!(times[1].timestamp(), 784903526);
    assert_eq!(times[2].timestamp(), 0);
}

#[tokio::test]
async fn test_not_found_maps_to_epoch() {
    let fixture = MockServerFixture::new().await;
    let _gone = fixture.mock_status("GET", "/gone", 404).await;

    let executor = fixture.executor(10);
    let times = fetch_last_modified(
        &executor,
        &CancellationToken::new(),
        None,
        [fixture.url("/gone")],
    )
    .await
    .unwrap();
    assert_eq!(times.len(), 1);
    assert_eq!(times[0].timestamp(), 0);
}

#[tokio::test]
async fn test_server_error_fails_whole_batch() {
    let fixture = MockServerFixture::new().await;
    let _ok = fixture.mock_last_modified("/ok", 200, HTTP_DATE).await;
    let _broken = fixture.mock_status("GET", "/broken", 500).await;

    let executor = fixture.executor(10);
    let err = fetch_last_modified(
        &executor,
        &CancellationToken::new(),
        None,
        [fixture.url("/ok"), fixture.url("/broken")],
    )
    .await
    .unwrap_err();

    match err {
        Error::RequestFailed { url, status } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/broken"));
        }
        other => panic!("expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_let_in_flight_finish_still_fails_fast() {
    let fixture = MockServerFixture::new().await;
    let _broken = fixture.mock_status("GET", "/broken", 500).await;
    let _ok = fixture.mock_last_modified("/ok", 200, HTTP_DATE).await;

    let executor = fixture.executor(10);
    let cancel = CancellationToken::new();
    let result = fetch_last_modified_with_policy(
        &executor,
        &cancel,
        None,
        [fixture.url("/broken"), fixture.url("/ok")],
        FailurePolicy::LetInFlightFinish,
    )
    .await;

    assert!(matches!(result, Err(Error::RequestFailed { status: 500, .. })));
    // The caller's token is never touched by the helper.
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_malformed_header_fails() {
    let fixture = MockServerFixture::new().await;
    let _bad = fixture.mock_last_modified("/bad", 200, "last tuesday").await;

    let executor = fixture.executor(10);
    let err = fetch_last_modified(&executor, &CancellationToken::new(), None, [fixture.url("/bad")])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LastModified { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_first_failure_cancels_in_flight_sends() {
    let sender = fail_fast_with(FailurePolicy::default()).await;

    assert_eq!(sender.abandoned.load(Ordering::SeqCst), 1);
    assert_eq!(sender.completed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_let_in_flight_finish_leaves_sends_running() {
    let sender = fail_fast_with(FailurePolicy::LetInFlightFinish).await;

    assert_eq!(sender.abandoned.load(Ordering::SeqCst), 0);
    assert_eq!(sender.completed.load(Ordering::SeqCst), 1);
}
