//! Last-Modified Example
//!
//! Fetches the last modification date of several resources. A 404 counts as
//! "never modified" (the Unix epoch); any other unexpected status aborts the
//! whole batch.
//!
//! Usage:
//!   cargo run --example last_modified -- <url>...

use httpbulk::{fetch_last_modified, Executor};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        urls = vec![
            "https://www.rust-lang.org/static/images/rust-logo-blk.svg".to_string(),
            "https://www.rust-lang.org/this-page-does-not-exist".to_string(),
        ];
    }

    let executor = Executor::from_env()?;
    let times =
        fetch_last_modified(&executor, &CancellationToken::new(), None, urls.clone()).await?;

    for (url, ts) in urls.iter().zip(times) {
        println!("{url}\t{}", ts.to_rfc3339());
    }
    Ok(())
}
