//! Bounded concurrent dispatcher.
//!
//! # Executor
//!
//! [`Executor`] fans a batch of URLs out into one Tokio task per URL and
//! hands back one handle per URL, in input order. A counting permit pool
//! bounds how many sends are in flight at once; completion order is
//! unspecified.
//!
//! ## Per-task flow
//!
//! 1. wait for a permit (skipped when the executor is unbounded)
//! 2. build a `GET` request for the URL
//! 3. run the request hook, if any; a hook error skips the send
//! 4. send, racing the cancellation token
//! 5. publish the [`BulkResult`] and release the permit
//!
//! Every exit path publishes a result, so a handle never waits forever.
//!
//! ## Example
//!
//! ```rust,no_run
//! use httpbulk::{Executor, ExecutorOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() {
//! let executor = Executor::new(ExecutorOptions::new().with_concurrency_limit(4));
//! let cancel = CancellationToken::new();
//!
//! let futures = executor.submit_futures(&cancel, ["https://example.com", "https://example.org"]);
//! for future in &futures {
//!     let result = future.get().await;
//!     match result.response() {
//!         Some(resp) => println!("{} -> {}", result.url(), resp.status()),
//!         None => println!("{} failed: {:?}", result.url(), result.error()),
//!     }
//! }
//! # }
//! ```

mod options;
mod signals;

pub use options::{ExecutorOptions, DEFAULT_CONCURRENCY_LIMIT};
pub use signals::InflightSnapshot;

use crate::future::{BulkFuture, ResultReceiver};
use crate::result::BulkResult;
use crate::transport::Sender;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Mutates a request right before it is sent (headers, method, auth...).
/// Returning an error skips the send and becomes the task's result.
pub type RequestHook = Arc<dyn Fn(&mut reqwest::Request) -> Result<()> + Send + Sync>;

/// Central bulk request dispatcher.
///
/// Cloning is cheap and clones share the permit pool, so one executor can
/// serve many concurrent batches.
#[derive(Clone)]
pub struct Executor {
    sender: Arc<dyn Sender>,
    permits: Option<Arc<Semaphore>>,
    max_inflight: Option<usize>,
    closed: Arc<AtomicBool>,
}

impl Executor {
    pub fn new(options: ExecutorOptions) -> Self {
        let max_inflight = options.permit_capacity();
        Self {
            sender: options.sender,
            permits: max_inflight.map(|n| Arc::new(Semaphore::new(n))),
            max_inflight,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Executor configured through [`ExecutorOptions::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ExecutorOptions::from_env()?))
    }

    /// Closes the permit pool and makes the executor unusable.
    ///
    /// Submitting afterwards is a programming error: it is logged and every
    /// handle of that submission resolves with [`Error::ExecutorClosed`].
    /// Tasks still waiting for a permit resolve the same way; tasks already
    /// sending run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(permits) = &self.permits {
            permits.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Permit pool capacity, `None` when unbounded.
    pub fn concurrency_limit(&self) -> Option<usize> {
        self.max_inflight
    }

    /// Snapshot of the permit pool, `None` when unbounded.
    pub fn inflight(&self) -> Option<InflightSnapshot> {
        let permits = self.permits.as_ref()?;
        let max = self.max_inflight?;
        Some(InflightSnapshot::new(max, permits.available_permits()))
    }

    /// Issue one request per URL. See [`submit_with_hook`](Self::submit_with_hook).
    pub fn submit<I, S>(&self, cancel: &CancellationToken, urls: I) -> Vec<ResultReceiver>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.submit_with_hook(cancel, None, urls)
    }

    /// Issue one request per URL, running `hook` on each request before it
    /// is sent.
    ///
    /// Returns immediately with one receiver per URL, in input order. Each
    /// receiver yields exactly one [`BulkResult`] whose `url` is the
    /// submitted URL. Cancelling `cancel` aborts every send of this batch
    /// that has not produced a response yet.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit_with_hook<I, S>(
        &self,
        cancel: &CancellationToken,
        hook: Option<RequestHook>,
        urls: I,
    ) -> Vec<ResultReceiver>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|url| self.dispatch(cancel, hook.clone(), url.into()))
            .collect()
    }

    /// Issue one request per URL, each wrapped in a [`BulkFuture`].
    pub fn submit_futures<I, S>(&self, cancel: &CancellationToken, urls: I) -> Vec<BulkFuture>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.submit_futures_with_hook(cancel, None, urls)
    }

    /// [`submit_with_hook`](Self::submit_with_hook), each receiver wrapped in
    /// a [`BulkFuture`].
    pub fn submit_futures_with_hook<I, S>(
        &self,
        cancel: &CancellationToken,
        hook: Option<RequestHook>,
        urls: I,
    ) -> Vec<BulkFuture>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|url| {
                let url = url.into();
                let receiver = self.dispatch(cancel, hook.clone(), url.clone());
                BulkFuture::new(url, receiver)
            })
            .collect()
    }

    fn dispatch(
        &self,
        cancel: &CancellationToken,
        hook: Option<RequestHook>,
        url: String,
    ) -> ResultReceiver {
        let (tx, rx) = oneshot::channel();

        if self.is_closed() {
            error!(url = %url, "request submitted to a closed executor");
            let _ = tx.send(BulkResult::failed(url, Error::ExecutorClosed));
            return rx;
        }

        // Malformed URLs never reach the permit pool.
        let target = match Url::parse(&url) {
            Ok(target) => target,
            Err(source) => {
                warn!(url = %url, error = %source, "invalid url");
                let _ = tx.send(BulkResult::failed(
                    url.clone(),
                    Error::InvalidUrl { url, source },
                ));
                return rx;
            }
        };

        let span = debug_span!("bulk_request", request_id = %Uuid::new_v4(), url = %url);
        let task = RequestTask {
            sender: Arc::clone(&self.sender),
            cancel: cancel.clone(),
            hook,
            url,
            target,
        };
        let permits = self.permits.clone();

        tokio::spawn(
            async move {
                let _permit = match acquire(permits).await {
                    Ok(permit) => permit,
                    Err(err) => {
                        error!("executor closed while waiting for a permit");
                        let _ = tx.send(BulkResult::failed(task.url, err));
                        return;
                    }
                };

                let result = task.run().await;
                // The receiver may be gone; nobody is interested then.
                let _ = tx.send(result);
            }
            .instrument(span),
        );

        rx
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorOptions::default())
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("max_inflight", &self.max_inflight)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

async fn acquire(permits: Option<Arc<Semaphore>>) -> Result<Option<OwnedSemaphorePermit>> {
    match permits {
        Some(sem) => sem
            .acquire_owned()
            .await
            .map(Some)
            .map_err(|_| Error::ExecutorClosed),
        None => Ok(None),
    }
}

struct RequestTask {
    sender: Arc<dyn Sender>,
    cancel: CancellationToken,
    hook: Option<RequestHook>,
    url: String,
    target: Url,
}

impl RequestTask {
    async fn run(self) -> BulkResult {
        let mut request = reqwest::Request::new(reqwest::Method::GET, self.target);

        if let Some(hook) = &self.hook {
            if let Err(err) = hook(&mut request) {
                warn!(error = %err, "request hook failed, skipping send");
                return BulkResult::new(self.url, None, Duration::ZERO, Some(err));
            }
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            res = self.sender.send(request) => res,
        };
        let duration = start.elapsed();

        match outcome {
            Ok(response) => {
                debug!(
                    status = response.status().as_u16(),
                    elapsed_ms = duration.as_millis() as u64,
                    "request completed"
                );
                BulkResult::new(self.url, Some(response), duration, None)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    elapsed_ms = duration.as_millis() as u64,
                    "request failed"
                );
                BulkResult::new(self.url, None, duration, Some(err))
            }
        }
    }
}
