// Long-running worker: polls the queue and executes jobs until terminated.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use leadgen_core::jobs::Worker;
use leadgen_core::{Config, PipelineDeps};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leadgen_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let poll_interval = Duration::from_millis(config.worker_poll_ms);
    let deps = Arc::new(PipelineDeps::from_config(config).context("Failed to build dependencies")?);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    Worker::new(deps, poll_interval).run(shutdown).await
}
