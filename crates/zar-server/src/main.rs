mod client_info;
mod extract;
mod funnel;
mod handlers;
mod middleware;
mod object_store;
mod pages;
mod qr;
mod routes;
mod services;
mod state;

use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use zar_core::AppConfig;
use zar_db::close_pool;
use zar_monitor::spawn_sampler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.server.bind_addr.clone();
    let state = AppState::init(config).await?;

    // Periodic process sampler, cancelled with a bounded join at shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sampler = spawn_sampler(Arc::clone(state.monitor()), shutdown_rx);

    let app = routes::create_router(state.clone());

    tracing::info!(%addr, "zar-server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Orderly teardown: sampler first, then the pools.
    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(5), sampler)
        .await
        .is_err()
    {
        tracing::warn!("sampler did not stop in time");
    }
    close_pool(state.db()).await;

    tracing::info!("zar-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
