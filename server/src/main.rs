use ferry_core::{Config, Relay};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> ferry_core::Result<()> {
    ferry_core::init_logging();

    let config = Config::from_env()?;
    let relay = Relay::with_timeout(config.upstream_timeout())?;

    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        upstream_timeout_secs = ?config.upstream_timeout_secs,
        "Ferry relay listening"
    );

    axum::serve(listener, ferry_server::router(relay))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Ferry relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
