use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sparrow_tracker::{
    handlers,
    state::{AppConfig, AppState},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let app_state = Arc::new(AppState::new(config).await?);
    app_state.poller.start();

    let app = handlers::router(app_state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    app_state.poller.stop();
    Ok(())
}
