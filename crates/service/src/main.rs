use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod error;
mod session;
mod storage;

use app::{router, AppState};
use config::ServiceConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();
    let config = ServiceConfig::load()?;
    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;
    let state = Arc::new(AppState::from_config(config)?);
    info!(
        database = %state.config.database.display(),
        uploads = %state.config.upload_dir.display(),
        "store ready"
    );
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            // Without a signal handler, run until the process is killed.
            warn!(error = %err, "failed to install shutdown handler");
            std::future::pending::<()>().await
        }
    }
}
