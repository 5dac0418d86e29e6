//! Network boundary: the [`Sender`] capability and its default implementation.
//!
//! The executor never talks to the network directly. It hands a fully built
//! (and possibly hook-mutated) [`reqwest::Request`] to a [`Sender`] and wraps
//! whatever comes back into a [`BulkResult`](crate::BulkResult).
//! Cancellation is applied by the executor around the send future, so
//! implementations only need to perform the I/O.

mod http;

pub use http::HttpSender;
pub(crate) use http::env_parse;

use crate::response::Response;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can perform one HTTP exchange.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, request: reqwest::Request) -> Result<Response>;
}

#[async_trait]
impl<S: Sender + ?Sized> Sender for Arc<S> {
    async fn send(&self, request: reqwest::Request) -> Result<Response> {
        (**self).send(request).await
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(Arc<reqwest::Error>),

    #[error("Transport error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(Arc::new(err))
    }
}

impl From<reqwest::Error> for crate::Error {
    fn from(err: reqwest::Error) -> Self {
        crate::Error::Transport(err.into())
    }
}
