//! Repeatable-read handle over a single-delivery result channel.

use crate::codec::{BodyDecoder, JsonDecoder};
use crate::result::BulkResult;
use crate::{BoxStream, Error, Result};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;

/// Receiving end of one request task.
pub type ResultReceiver = oneshot::Receiver<BulkResult>;

/// Holder for a [`ResultReceiver`] that can be read any number of times.
///
/// The first completed read caches the result; every later read returns the
/// same `Arc` without touching the channel again. A wait that is abandoned
/// (cancelled token, elapsed timeout) leaves the channel intact, so a later
/// read can still pick the result up.
///
/// The response body gets a second, independent cache: it is read once on
/// the first decode attempt and the bytes (or the read error) are replayed
/// for every decode after that, whatever target type is requested. A decode
/// dropped halfway through the read keeps the stream and the chunks read so
/// far; the next decode carries on from there.
#[derive(Debug)]
pub struct BulkFuture {
    url: String,
    done: AtomicBool,
    // Guards the channel and the result cache together; waiters queue here.
    state: Mutex<State>,
    body: Mutex<BodyState>,
}

#[derive(Debug)]
struct State {
    receiver: ResultReceiver,
    result: Option<Arc<BulkResult>>,
}

#[derive(Default)]
struct BodyState {
    stream: Option<BoxStream<'static, Bytes>>,
    buf: BytesMut,
    outcome: Option<Result<Bytes>>,
}

impl fmt::Debug for BodyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyState")
            .field("reading", &self.stream.is_some())
            .field("buffered", &self.buf.len())
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl BulkFuture {
    pub fn new(url: impl Into<String>, receiver: ResultReceiver) -> Self {
        Self {
            url: url.into(),
            done: AtomicBool::new(false),
            state: Mutex::new(State {
                receiver,
                result: None,
            }),
            body: Mutex::new(BodyState::default()),
        }
    }

    /// The URL this future was created for.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether a read already completed. Never blocks.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Wait for the result and cache it.
    ///
    /// If the producing task disappeared without publishing, a result
    /// carrying [`Error::TaskAborted`] is cached instead.
    pub async fn get(&self) -> Arc<BulkResult> {
        let mut state = self.state.lock().await;
        if let Some(result) = &state.result {
            return Arc::clone(result);
        }

        // `&mut receiver` keeps the channel usable if this wait is dropped.
        let result = match (&mut state.receiver).await {
            Ok(result) => result,
            Err(_) => BulkResult::failed(
                self.url.clone(),
                Error::TaskAborted {
                    url: self.url.clone(),
                },
            ),
        };

        let result = Arc::new(result);
        state.result = Some(Arc::clone(&result));
        self.done.store(true, Ordering::Release);
        result
    }

    /// Like [`get`](Self::get), but gives up with [`Error::Cancelled`] once
    /// `cancel` fires. A result that is already available wins over a fired
    /// token. Giving up does not mark the future done.
    pub async fn get_with_cancel(&self, cancel: &CancellationToken) -> Result<Arc<BulkResult>> {
        tokio::select! {
            biased;
            result = self.get() => Ok(result),
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Like [`get`](Self::get), but gives up with [`Error::DeadlineExceeded`]
    /// after `timeout`. Giving up does not mark the future done.
    pub async fn get_with_timeout(&self, timeout: Duration) -> Result<Arc<BulkResult>> {
        tokio::time::timeout(timeout, self.get())
            .await
            .map_err(|_| Error::DeadlineExceeded)
    }

    /// Cached raw body. Result errors win over everything else; a failed
    /// read is cached and returned again on every call.
    pub async fn body_bytes(&self) -> Result<Bytes> {
        let result = self.get().await;
        let response = result.response_or_err()?;

        let mut body = self.body.lock().await;
        let state = &mut *body;
        if let Some(outcome) = &state.outcome {
            return outcome.clone();
        }

        let stream = match state.stream.take() {
            Some(stream) => stream,
            None => match response.take_body() {
                Ok(stream) => stream,
                Err(err) => {
                    state.outcome = Some(Err(err.clone()));
                    return Err(err);
                }
            },
        };
        let stream = state.stream.insert(stream);

        // `next` is cancel-safe: an abandoned wait loses no chunk.
        let outcome = loop {
            match stream.next().await {
                Some(Ok(chunk)) => state.buf.extend_from_slice(&chunk),
                Some(Err(err)) => break Err(err),
                None => break Ok(state.buf.split().freeze()),
            }
        };

        state.stream = None;
        state.buf = BytesMut::new();
        state.outcome = Some(outcome.clone());
        outcome
    }

    /// Decode the cached body as JSON.
    pub async fn decode_body<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_body_with(&JsonDecoder).await
    }

    /// Decode the cached body with `decoder`. Decode errors are not cached.
    pub async fn decode_body_with<T, D>(&self, decoder: &D) -> Result<T>
    where
        T: DeserializeOwned,
        D: BodyDecoder,
    {
        let body = self.body_bytes().await?;
        decoder.decode(&body)
    }
}
