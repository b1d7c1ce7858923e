// Main entry point for the pipeline API server

use std::sync::Arc;

use anyhow::{Context, Result};
use leadgen_core::server::build_app;
use leadgen_core::{Config, PipelineDeps};
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
    let port = config.port;
    let deps = Arc::new(PipelineDeps::from_config(config).context("Failed to build dependencies")?);

    tracing::info!(
        data_dir = %deps.paths.root().display(),
        remote = deps.config.supabase.is_some(),
        "starting pipeline server"
    );

    let app = build_app(deps);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
