use crate::transport::{HttpSender, Sender};
use crate::{Error, Result};
use std::sync::Arc;

/// Default number of requests allowed in flight at once.
pub const DEFAULT_CONCURRENCY_LIMIT: isize = 10;

/// Configuration consumed once by [`Executor::new`](super::Executor::new).
///
/// Keep this surface area small: a concurrency bound and the capability that
/// performs the I/O. Everything about the HTTP client itself lives in the
/// sender.
#[derive(Clone)]
pub struct ExecutorOptions {
    /// Maximum number of concurrent sends. Zero or negative disables the
    /// bound; use with care, the sender must cope with the fan-out.
    pub concurrency_limit: isize,
    pub sender: Arc<dyn Sender>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            sender: Arc::new(HttpSender::default()),
        }
    }
}

impl ExecutorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden from the environment:
    /// - `HTTPBULK_CONCURRENCY_LIMIT` (default 10, `<= 0` for unbounded)
    /// - the `HTTPBULK_*` knobs of [`HttpSender::from_env`]
    pub fn from_env() -> Result<Self> {
        let concurrency_limit = crate::transport::env_parse::<isize>("HTTPBULK_CONCURRENCY_LIMIT")
            .map_err(|e| {
                Error::configuration_with_context(
                    "invalid concurrency limit",
                    e.context()
                        .cloned()
                        .unwrap_or_default()
                        .with_source("executor_options"),
                )
            })?
            .unwrap_or(DEFAULT_CONCURRENCY_LIMIT);

        Ok(Self {
            concurrency_limit,
            sender: Arc::new(HttpSender::from_env()?),
        })
    }

    pub fn with_concurrency_limit(mut self, limit: isize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_sender(mut self, sender: Arc<dyn Sender>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_http_sender(self, sender: HttpSender) -> Self {
        self.with_sender(Arc::new(sender))
    }

    /// Permit pool capacity, `None` when unbounded.
    pub fn permit_capacity(&self) -> Option<usize> {
        usize::try_from(self.concurrency_limit)
            .ok()
            .filter(|n| *n > 0)
            .map(|n| n.min(tokio::sync::Semaphore::MAX_PERMITS))
    }
}

impl std::fmt::Debug for ExecutorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorOptions")
            .field("concurrency_limit", &self.concurrency_limit)
            .finish_non_exhaustive()
    }
}
