use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mercado_node::clock::SystemClock;
use mercado_node::config::Config;
use mercado_node::store::{MemoryStore, PgStore, Store};
use mercado_node::{prepare, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    let store: Arc<dyn Store> = match config.database_url.as_deref() {
        Some(url) => Arc::new(
            PgStore::connect(url, config.pool_size)
                .context("Invalid PostgreSQL configuration")?,
        ),
        None => {
            warn!("DATABASE_URL not set; data lives in memory and is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    prepare(store.as_ref(), config.seed_demo)
        .await
        .context("Failed to prepare the database")?;

    let backend = store.backend();
    let state = AppState::new(store, Arc::new(SystemClock), config.premium.clone());
    let app = router(state);

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!(%address, backend, "Marketplace listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
