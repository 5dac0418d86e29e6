//! Multi-GET Example
//!
//! Fetches several pages in parallel and prints the status of each one, in
//! the order the URLs were given.
//!
//! Usage:
//!   cargo run --example multi_get

use httpbulk::Executor;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let executor = Executor::default();

    let urls = [
        "https://www.rust-lang.org",
        "https://crates.io",
        "https://docs.rs",
        "https://tokio.rs",
    ];

    let receivers = executor.submit(&CancellationToken::new(), urls);
    for receiver in receivers {
        let Ok(result) = receiver.await else {
            continue;
        };

        match (result.response(), result.error()) {
            (Some(resp), None) => println!(
                "{} responded with {} in {:?}",
                result.url(),
                resp.status(),
                result.duration()
            ),
            (_, Some(err)) => println!("{} failed: {}", result.url(), err),
            (None, None) => println!("{} produced nothing", result.url()),
        }
    }

    executor.close();
}
