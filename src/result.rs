//! Outcome record of one dispatched request.

use crate::codec::{BodyDecoder, JsonDecoder};
use crate::response::Response;
use crate::transport::TransportError;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Immutable outcome of one request: the URL as submitted, the response or
/// the error, and how long the send took.
///
/// When `error` is set it takes precedence over everything else; accessors
/// that read the body return it before touching the response.
#[derive(Debug)]
pub struct BulkResult {
    url: String,
    response: Option<Response>,
    duration: Duration,
    error: Option<Error>,
}

impl BulkResult {
    pub fn new(
        url: impl Into<String>,
        response: Option<Response>,
        duration: Duration,
        error: Option<Error>,
    ) -> Self {
        Self {
            url: url.into(),
            response,
            duration,
            error,
        }
    }

    pub(crate) fn failed(url: impl Into<String>, error: Error) -> Self {
        Self::new(url, None, Duration::ZERO, Some(error))
    }

    /// The URL as originally submitted. The final URL after redirects is on
    /// the response.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Time spent in the send, zero if nothing was sent.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.response.is_some()
    }

    /// The response, or the error that replaced it.
    pub fn response_or_err(&self) -> Result<&Response> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.response.as_ref().ok_or_else(|| {
            TransportError::Other(format!("no response recorded for {}", self.url)).into()
        })
    }

    pub fn into_parts(self) -> (String, Option<Response>, Duration, Option<Error>) {
        (self.url, self.response, self.duration, self.error)
    }

    /// Read the body and decode it as JSON. The body is read and closed on
    /// every call; nothing is cached, so a second call reports
    /// [`Error::BodyConsumed`].
    pub async fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_with(&JsonDecoder).await
    }

    pub async fn decode_with<T, D>(&self, decoder: &D) -> Result<T>
    where
        T: DeserializeOwned,
        D: BodyDecoder,
    {
        let body = self.response_or_err()?.bytes().await?;
        decoder.decode(&body)
    }

    /// Read and discard the body.
    pub async fn drain(&self) -> Result<()> {
        self.response_or_err()?.drain().await
    }
}
