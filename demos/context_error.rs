//! Cancellation Example
//!
//! Shows how a cancelled token propagates into every result of a batch:
//! nothing is sent, and each handle still resolves, carrying the
//! cancellation error.
//!
//! Usage:
//!   cargo run --example context_error

use httpbulk::{Executor, ExecutorOptions};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let executor = Executor::new(ExecutorOptions::new().with_concurrency_limit(10));

    let urls = [
        "https://www.rust-lang.org",
        "https://crates.io",
        "https://docs.rs",
        "https://tokio.rs",
    ];

    let cancel = CancellationToken::new();
    cancel.cancel(); // Immediately cancel the batch

    for future in executor.submit_futures(&cancel, urls) {
        let result = future.get().await;
        match result.error() {
            Some(err) => println!("{} responded with {}", result.url(), err),
            None => println!("{} unexpectedly succeeded", result.url()),
        }
    }
}
