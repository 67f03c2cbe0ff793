//! Memo Cache - frame host
//!
//! Reads one frame request document from stdin, runs it against the cache
//! configured by the environment, and prints the report to stdout.
//!
//! An empty stdin is an overview request.

use std::io::Read;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::models::FrameRequest;
use memo_cache::{run_frame, CacheConfig, CacheManager};

/// Main entry point for the cache frame.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Load configuration from environment variables
/// 3. Open the cache, loading its index
/// 4. Read and run the request
/// 5. Flush the index and print the report
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CacheConfig::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: root={}, max_size_bytes={}",
        config.cache_root.display(),
        config.max_size_bytes
    );

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading frame request from stdin")?;
    let request: FrameRequest = if input.trim().is_empty() {
        FrameRequest::default()
    } else {
        serde_json::from_str(&input).context("parsing frame request")?
    };

    let manager = CacheManager::open(&config);
    let report = run_frame(&manager, request).await;
    manager.close().await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}
