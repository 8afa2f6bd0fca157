//! hackerbeat — Binary Entrypoint
//! Loads configuration, starts the polling scheduler and waits for Ctrl-C.

use anyhow::{Context, Result};
use hackerbeat::config::load_config_default;
use hackerbeat::metrics::Metrics;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON lines when HACKERBEAT_LOG_FORMAT=json.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hackerbeat=info,warn"));

    let json = std::env::var("HACKERBEAT_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        // Events go to stdout; keep logs on stderr so they don't interleave.
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("error reading config file")?;

    if let Some(addr) = cfg.monitoring_addr {
        let metrics = Metrics::install()?;
        tokio::spawn(async move {
            if let Err(e) = metrics.serve(addr).await {
                tracing::warn!(error = ?e, "monitoring endpoint stopped");
            }
        });
    }

    let scheduler = hackerbeat::build_scheduler(&cfg)?;
    let handle = scheduler.spawn();

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;
    tracing::info!("stop requested");
    handle.stop().await
}
