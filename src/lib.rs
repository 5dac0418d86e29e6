//! # httpbulk
//!
//! Bounded concurrent HTTP fan-out with cached, repeatable-read results.
//!
//! ## Overview
//!
//! Hand a batch of URLs to an [`Executor`]; it starts one Tokio task per URL,
//! never lets more than the configured number of sends run at once, and
//! returns one handle per URL in input order. Each handle resolves to a
//! [`BulkResult`]: the submitted URL, the response or the error, and the
//! time the send took.
//!
//! Handles come in two flavours:
//!
//! - a raw [`ResultReceiver`] (a oneshot channel), read once
//! - a [`BulkFuture`], which caches the first read, supports cancellable and
//!   timeout-bound waits, and decodes the body into as many target types as
//!   needed while reading it only once
//!
//! Task-level failures (bad URL, failing hook, transport error,
//! cancellation) never escape as panics; they are stored in the result.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use httpbulk::{Executor, ExecutorOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> httpbulk::Result<()> {
//!     let executor = Executor::new(ExecutorOptions::new().with_concurrency_limit(8));
//!
//!     let futures = executor.submit_futures(
//!         &CancellationToken::new(),
//!         ["https://example.com/a.json", "https://example.com/b.json"],
//!     );
//!
//!     for future in &futures {
//!         let value: serde_json::Value = future.decode_body().await?;
//!         println!("{}: {}", future.url(), value);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`executor`] | Permit-bounded dispatcher and its options |
//! | [`future`] | Repeatable-read result handle |
//! | [`result`] | Outcome record of one request |
//! | [`response`] | Response head with a one-shot body |
//! | [`transport`] | `Sender` capability and the `reqwest` implementation |
//! | [`codec`] | Body decoders (JSON, YAML) |
//! | `lastmod` | Last-modified timestamps for a batch (feature `lastmod`) |

pub mod codec;
pub mod executor;
pub mod future;
pub mod response;
pub mod result;
pub mod transport;

#[cfg(feature = "lastmod")]
pub mod lastmod;


// Re-export main types for convenience
pub use codec::{BodyDecoder, JsonDecoder, YamlDecoder};
pub use executor::{Executor, ExecutorOptions, InflightSnapshot, RequestHook};
pub use future::{BulkFuture, ResultReceiver};
pub use response::Response;
pub use result::BulkResult;
pub use transport::{HttpSender, Sender, TransportError};

#[cfg(feature = "lastmod")]
pub use lastmod::{fetch_last_modified, fetch_last_modified_with_policy, FailurePolicy};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
