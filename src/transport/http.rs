use crate::error::ErrorContext;
use crate::response::Response;
use crate::transport::{Sender, TransportError};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// [`Sender`] backed by a shared `reqwest::Client`.
///
/// Client-level concerns (TLS, redirects, pooling) belong to the wrapped
/// client; build one yourself and use [`HttpSender::with_client`] when the
/// defaults do not fit.
#[derive(Debug, Clone, Default)]
pub struct HttpSender {
    client: reqwest::Client,
}

impl HttpSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client from `HTTPBULK_*` environment variables.
    ///
    /// - `HTTPBULK_HTTP_TIMEOUT_SECS` (default 30)
    /// - `HTTPBULK_POOL_MAX_IDLE_PER_HOST` (default 32)
    /// - `HTTPBULK_POOL_IDLE_TIMEOUT_SECS` (default 90)
    /// - `HTTPBULK_PROXY_URL` (optional)
    pub fn from_env() -> Result<Self> {
        let timeout_secs =
            env_parse("HTTPBULK_HTTP_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_idle = env_parse("HTTPBULK_POOL_MAX_IDLE_PER_HOST")?
            .unwrap_or(DEFAULT_POOL_MAX_IDLE_PER_HOST);
        let idle_timeout = env_parse("HTTPBULK_POOL_IDLE_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_POOL_IDLE_TIMEOUT_SECS);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(max_idle)
            .pool_idle_timeout(Some(Duration::from_secs(idle_timeout)));

        if let Ok(proxy_url) = env::var("HTTPBULK_PROXY_URL") {
            let proxy = Proxy::all(&proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    "invalid proxy url",
                    ErrorContext::new()
                        .with_field_path("HTTPBULK_PROXY_URL")
                        .with_details(e.to_string())
                        .with_source("http_sender"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Sender for HttpSender {
    async fn send(&self, request: reqwest::Request) -> Result<Response> {
        let resp = self.client.execute(request).await?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = resp.bytes_stream().map_err(Error::from);

        Ok(Response::new(status, headers, url, Box::pin(body)))
    }
}

pub(crate) fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot parse {:?}", raw),
                ErrorContext::new()
                    .with_field_path(key)
                    .with_details(e.to_string())
                    .with_source("environment"),
            )
        }),
        Err(_) => Ok(None),
    }
}
