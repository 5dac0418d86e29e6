//! Integration tests for the executor and futures over real HTTP

use crate::integration::mock_server::MockServerFixture;
use httpbulk::{Error, RequestHook};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize, PartialEq)]
struct SampleObject {
    #[serde(rename = "someInt")]
    some_int: i64,
    #[serde(rename = "someString")]
    some_string: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct OnlyString {
    #[serde(rename = "someString")]
    some_string: String,
}

#[tokio::test]
async fn test_batch_execution_order_preserving() {
    let fixture = MockServerFixture::new().await;
    let _a = fixture.mock_status("GET", "/a", 200).await;
    let _b = fixture.mock_status("GET", "/b", 404).await;
    let _c = fixture.mock_status("GET", "/c", 503).await;

    let executor = fixture.executor(2);
    let urls = vec![fixture.url("/a"), fixture.url("/b"), fixture.url("/c")];
    let receivers = executor.submit(&CancellationToken::new(), urls.clone());

    let mut statuses = Vec::new();
    for (receiver, url) in receivers.into_iter().zip(&urls) {
        let result = receiver.await.unwrap();
        assert_eq!(result.url(), url);
        assert!(result.error().is_none(), "unexpected error {:?}", result.error());
        statuses.push(result.response().unwrap().status().as_u16());
    }
    assert_eq!(statuses, vec![200, 404, 503]);
}

#[tokio::test]
async fn test_future_decodes_body_into_several_shapes() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response("/obj", 200, r#"{"someInt":4,"someString":"test"}"#)
        .await;

    let executor = fixture.executor(10);
    let futures = executor.submit_futures(&CancellationToken::new(), [fixture.url("/obj")]);
    let future = &futures[0];

    let full: SampleObject = future.decode_body().await.unwrap();
    let partial: OnlyString = future.decode_body().await.unwrap();
    assert_eq!(
        full,
        SampleObject {
            some_int: 4,
            some_string: "test".into()
        }
    );
    assert_eq!(partial.some_string, full.some_string);
    assert!(future.is_done());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_hook_switches_every_request_to_head() {
    let fixture = MockServerFixture::new().await;
    let heads = {
        let mut server = fixture.server.lock().await;
        server
            .mock("HEAD", mockito::Matcher::Regex("^/(a|b|c)$".to_string()))
            .with_status(200)
            .with_header("etag", "\"v1\"")
            .expect(3)
            .create_async()
            .await
    };
    let gets = fixture.mock_never("GET", "/a").await;

    let hook: RequestHook = Arc::new(|req: &mut reqwest::Request| -> httpbulk::Result<()> {
        *req.method_mut() = reqwest::Method::HEAD;
        Ok(())
    });

    let executor = fixture.executor(10);
    let futures = executor.submit_futures_with_hook(
        &CancellationToken::new(),
        Some(hook),
        [fixture.url("/a"), fixture.url("/b"), fixture.url("/c")],
    );
    for future in &futures {
        let result = future.get().await;
        let resp = result.response().expect("response");
        assert_eq!(resp.header_str("etag"), Some("\"v1\""));
    }

    heads.assert_async().await;
    gets.assert_async().await;
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let fixture = MockServerFixture::new().await;
    let never = fixture.mock_never("GET", "/slow").await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let executor = fixture.executor(10);
    let urls: Vec<String> = (0..4).map(|_| fixture.url("/slow")).collect();
    let futures = executor.submit_futures(&cancel, urls);
    assert_eq!(futures.len(), 4);

    for future in &futures {
        let result = future.get().await;
        assert!(matches!(result.error(), Some(Error::Cancelled)));
        assert!(result.response().is_none());
    }
    never.assert_async().await;
}

#[tokio::test]
async fn test_mixed_batch_keeps_failures_local() {
    let fixture = MockServerFixture::new().await;
    let _ok = fixture.mock_status("GET", "/ok", 200).await;

    let executor = fixture.executor(3);
    let futures = executor.submit_futures(
        &CancellationToken::new(),
        [
            fixture.url("/ok"),
            "::not a url::".to_string(),
            // Port 1 is reserved; the connection is refused.
            "http://127.0.0.1:1/".to_string(),
        ],
    );

    assert!(futures[0].get().await.is_ok());
    assert!(matches!(
        futures[1].get().await.error(),
        Some(Error::InvalidUrl { .. })
    ));
    assert!(matches!(
        futures[2].get().await.error(),
        Some(Error::Transport(_))
    ));
}

#[tokio::test]
async fn test_result_error_wins_over_decode() {
    let fixture = MockServerFixture::new().await;
    let hook: RequestHook = Arc::new(|_req: &mut reqwest::Request| -> httpbulk::Result<()> {
        Err(Error::hook("expected error"))
    });

    let executor = fixture.executor(1);
    let futures = executor.submit_futures_with_hook(
        &CancellationToken::new(),
        Some(hook),
        [fixture.url("/x")],
    );

    let err = futures[0].decode_body::<SampleObject>().await.unwrap_err();
    assert_eq!(err.to_string(), "request hook failed: expected error");
}
