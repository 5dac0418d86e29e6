//! httpbulk: fetch many URLs at once from the command line
//!
//! Usage:
//!   httpbulk get [--limit <n>] [--head] <url>...     Fetch URLs, print status per URL
//!   httpbulk lastmod [--limit <n>] <url>...          Print last-modified date per URL

use anyhow::{bail, Context};
use httpbulk::{Executor, ExecutorOptions, RequestHook};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "get" => cmd_get(&args[2..]).await,
        "lastmod" => cmd_lastmod(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(err) = outcome {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"httpbulk: bounded concurrent HTTP fetching

USAGE:
    httpbulk <COMMAND> [OPTIONS] <URL>...

COMMANDS:
    get [--limit <n>] [--head] <url>...   Fetch URLs and print status, duration and size
    lastmod [--limit <n>] <url>...        Print the last-modified date of each URL
    version                               Show version information
    help                                  Show this help message

ENVIRONMENT:
    HTTPBULK_CONCURRENCY_LIMIT            Default concurrency limit (<= 0 for unbounded)
    HTTPBULK_HTTP_TIMEOUT_SECS            Per-request timeout (default 30)
    HTTPBULK_PROXY_URL                    Proxy for all requests
    RUST_LOG                              Log filter, e.g. httpbulk=debug"#
    );
}

fn cmd_version() {
    println!("httpbulk {}", env!("CARGO_PKG_VERSION"));
}

#[derive(Debug, Default)]
struct CommonArgs {
    limit: Option<isize>,
    head: bool,
    urls: Vec<String>,
}

fn parse_args(args: &[String], allow_head: bool) -> anyhow::Result<CommonArgs> {
    let mut parsed = CommonArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--limit" => {
                let raw = iter.next().context("--limit needs a value")?;
                let limit = raw
                    .parse()
                    .with_context(|| format!("invalid --limit {raw:?}"))?;
                parsed.limit = Some(limit);
            }
            "--head" if allow_head => parsed.head = true,
            flag if flag.starts_with("--") => bail!("unknown option {flag}"),
            url => parsed.urls.push(url.to_string()),
        }
    }
    if parsed.urls.is_empty() {
        bail!("no urls given");
    }
    Ok(parsed)
}

fn build_executor(limit: Option<isize>) -> anyhow::Result<Executor> {
    let mut options = ExecutorOptions::from_env().context("loading configuration")?;
    if let Some(limit) = limit {
        options = options.with_concurrency_limit(limit);
    }
    Ok(Executor::new(options))
}

/// Cancel the batch on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}

async fn cmd_get(args: &[String]) -> anyhow::Result<()> {
    let args = parse_args(args, true)?;
    let executor = build_executor(args.limit)?;
    let cancel = cancel_on_interrupt();

    let hook: Option<RequestHook> = if args.head {
        Some(Arc::new(|req: &mut reqwest::Request| -> httpbulk::Result<()> {
            *req.method_mut() = reqwest::Method::HEAD;
            Ok(())
        }))
    } else {
        None
    };

    let futures = executor.submit_futures_with_hook(&cancel, hook, args.urls);
    let mut failures = 0usize;
    for future in &futures {
        let result = future.get().await;
        match result.response() {
            Some(resp) if result.error().is_none() => {
                let size = future.body_bytes().await.map(|b| b.len());
                match size {
                    Ok(size) => println!(
                        "{}\t{}\t{}ms\t{} bytes",
                        result.url(),
                        resp.status().as_u16(),
                        result.duration().as_millis(),
                        size
                    ),
                    Err(err) => {
                        failures += 1;
                        println!(
                            "{}\t{}\tbody error: {}",
                            result.url(),
                            resp.status().as_u16(),
                            err
                        );
                    }
                }
            }
            _ => {
                failures += 1;
                let err = result
                    .error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no response".to_string());
                println!("{}\terror\t{}", result.url(), err);
            }
        }
    }

    executor.close();
    if failures > 0 {
        bail!("{failures} of {} requests failed", futures.len());
    }
    Ok(())
}

async fn cmd_lastmod(args: &[String]) -> anyhow::Result<()> {
    let args = parse_args(args, false)?;
    let executor = build_executor(args.limit)?;
    let cancel = cancel_on_interrupt();

    let times = httpbulk::fetch_last_modified(&executor, &cancel, None, args.urls.clone()).await?;
    for (url, ts) in args.urls.iter().zip(times) {
        println!("{}\t{}", url, ts.to_rfc3339());
    }

    executor.close();
    Ok(())
}
