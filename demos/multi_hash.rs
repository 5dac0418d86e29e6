//! Multi-Hash Example
//!
//! Issues HEAD requests (the body is not needed) and folds every ETag into a
//! single SHA-256 digest, e.g. to detect whether any of a set of resources
//! changed.
//!
//! Usage:
//!   cargo run --example multi_hash

use httpbulk::{Executor, RequestHook};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let executor = Executor::default();

    let urls = [
        "https://www.rust-lang.org",
        "https://crates.io",
        "https://docs.rs",
    ];

    // Change the request method to HEAD - we don't need the body
    let hook: RequestHook = Arc::new(|req: &mut reqwest::Request| -> httpbulk::Result<()> {
        *req.method_mut() = reqwest::Method::HEAD;
        Ok(())
    });

    let futures = executor.submit_futures_with_hook(&CancellationToken::new(), Some(hook), urls);

    let mut hasher = Sha256::new();
    for future in &futures {
        let result = future.get().await;
        let etag = result
            .response()
            .and_then(|resp| resp.header_str("etag"))
            .unwrap_or_default();
        println!("{} hash {}", result.url(), etag);
        hasher.update(etag.as_bytes());
    }

    println!("Final hash: {:x}", hasher.finalize());
    executor.close();
}
