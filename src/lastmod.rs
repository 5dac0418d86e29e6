//! Last-modified timestamps for many URLs at once.
//!
//! A consumer of the executor: it submits one request per URL and turns each
//! result into the parsed `last-modified` header. The batch fails on the
//! first failing URL (in input order); no partial results are returned.
//!
//! | status | outcome |
//! |--------|---------|
//! | 200, 304 | `last-modified` header, parsed as an HTTP date |
//! | 404 | Unix epoch |
//! | anything else | [`Error::RequestFailed`] |

use crate::executor::{Executor, RequestHook};
use crate::result::BulkResult;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What to do with requests still in flight once one URL has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Cancel the remaining sends of the batch.
    #[default]
    CancelInFlight,
    /// Leave the remaining sends running; their results are discarded.
    LetInFlightFinish,
}

/// Fetch the last modification date of every URL, cancelling the rest of
/// the batch on the first failure.
pub async fn fetch_last_modified<I, S>(
    executor: &Executor,
    cancel: &CancellationToken,
    hook: Option<RequestHook>,
    urls: I,
) -> Result<Vec<DateTime<Utc>>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fetch_last_modified_with_policy(executor, cancel, hook, urls, FailurePolicy::default()).await
}

pub async fn fetch_last_modified_with_policy<I, S>(
    executor: &Executor,
    cancel: &CancellationToken,
    hook: Option<RequestHook>,
    urls: I,
    policy: FailurePolicy,
) -> Result<Vec<DateTime<Utc>>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let batch = cancel.child_token();
    let guard = match policy {
        FailurePolicy::CancelInFlight => Some(batch.clone().drop_guard()),
        FailurePolicy::LetInFlightFinish => None,
    };

    let receivers = executor.submit_with_hook(&batch, hook, urls.iter().cloned());

    let mut times = Vec::with_capacity(urls.len());
    for (receiver, url) in receivers.into_iter().zip(urls) {
        let result = receiver.await.unwrap_or_else(|_| {
            BulkResult::failed(url.clone(), Error::TaskAborted { url: url.clone() })
        });
        match last_modified_of(&result).await {
            Ok(ts) => times.push(ts),
            Err(err) => {
                debug!(url = %url, error = %err, ?policy, "last-modified batch failed");
                return Err(err);
            }
        }
    }

    // Everything finished; nothing left to cancel.
    if let Some(guard) = guard {
        guard.disarm();
    }
    Ok(times)
}

/// Turn one result into its last-modified timestamp.
pub async fn last_modified_of(result: &BulkResult) -> Result<DateTime<Utc>> {
    let response = result.response_or_err()?;
    response.drain().await?;

    match response.status() {
        StatusCode::NOT_FOUND => Ok(DateTime::<Utc>::from(std::time::UNIX_EPOCH)),
        StatusCode::OK | StatusCode::NOT_MODIFIED => {
            let raw = response
                .header_str("last-modified")
                .ok_or_else(|| Error::LastModified {
                    url: result.url().to_string(),
                    message: "missing last-modified header".to_string(),
                })?;
            parse_http_date(raw).map_err(|message| Error::LastModified {
                url: result.url().to_string(),
                message,
            })
        }
        other => Err(Error::RequestFailed {
            url: result.url().to_string(),
            status: other.as_u16(),
        }),
    }
}

/// Parse an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid http date {:?}: {}", raw, e))
}
