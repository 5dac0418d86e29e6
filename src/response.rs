//! HTTP response with a one-shot body.

use crate::{BoxStream, Error, Result};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::sync::Mutex;
use url::Url;

/// Response head plus a body stream that can be consumed exactly once.
///
/// Reading the body (through [`Response::bytes`], [`Response::drain`] or
/// [`Response::take_body`]) moves the stream out; dropping it closes the
/// underlying connection stream. Later reads fail with
/// [`Error::BodyConsumed`].
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Mutex<Option<BoxStream<'static, Bytes>>>,
}

impl Response {
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        body: BoxStream<'static, Bytes>,
    ) -> Self {
        Self {
            status,
            headers,
            url,
            body: Mutex::new(Some(body)),
        }
    }

    /// Response with an in-memory body, mostly useful for custom senders.
    pub fn from_bytes(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        Self::new(
            status,
            headers,
            url,
            Box::pin(futures::stream::once(async move { Ok::<Bytes, Error>(body) })),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL of the exchange (after redirects, if the sender follows them).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// First value of `name` as trimmed text, if present and valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn is_body_consumed(&self) -> bool {
        self.lock_body().is_none()
    }

    /// Move the body stream out of the response.
    pub fn take_body(&self) -> Result<BoxStream<'static, Bytes>> {
        self.lock_body().take().ok_or(Error::BodyConsumed)
    }

    /// Read the whole body into memory. The stream is dropped on every exit
    /// path, including a failed read.
    pub async fn bytes(&self) -> Result<Bytes> {
        let mut stream = self.take_body()?;
        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    /// Read and discard the body.
    pub async fn drain(&self) -> Result<()> {
        let mut stream = self.take_body()?;
        while let Some(chunk) = stream.next().await {
            chunk?;
        }
        Ok(())
    }

    fn lock_body(&self) -> std::sync::MutexGuard<'_, Option<BoxStream<'static, Bytes>>> {
        // A poisoned lock only means another reader panicked mid-take; the
        // Option inside is still coherent.
        self.body.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body_consumed", &self.is_body_consumed())
            .finish()
    }
}
