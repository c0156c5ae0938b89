use crate::{RelayConfig, RelayService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tracing::info;

/// `GET /ws` upgrades to the call signaling socket, `GET /health` answers `ok`.
pub fn router(service: RelayService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Call relay listening on ws://{}/ws", config.bind);

    let app = router(RelayService::new(config));
    axum::serve(listener, app).await.context("Relay server failed")?;
    Ok(())
}
