//! HTTP relay between aircon clients and the vendor cloud.
//!
//! Routes (prefix `/api/bgh`):
//!
//! | Route | Success body |
//! |---|---|
//! | `GET /homes` | `{ "homes": [...] }` |
//! | `GET /homes/:homeId/devices` | `{ "devices": { id: device } }` |
//! | `GET /homes/:homeId/devices/:deviceId` | `{ "device": {...} }` |
//! | `POST /devices/:deviceId/mode` | `{ "result": {...} }` |
//!
//! plus `GET /api/ping`. Failures are `{ code, message }`.
//!
//! The vendor client is supplied by the embedder as a
//! [`GatewayFactory`]; [`run`] wires it to the shared configuration.

mod error;
mod handlers;
mod validate;

use std::net::SocketAddr;
use std::sync::Arc;

use aircon_api::GatewayFactory;
use aircon_config::{Config, ConfigError};
use aircon_core::CommandRelay;
use axum::Router;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

pub use error::{ApiError, INVALID_BODY, INVALID_PARAMETER};
pub use validate::{parse_numeric_param, validate_mode_body};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("relay server failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The relay's routes over `relay`.
pub fn router<F: GatewayFactory>(relay: Arc<CommandRelay<F>>) -> Router {
    let bgh = Router::new()
        .route("/homes", get(handlers::list_homes::<F>))
        .route("/homes/:home_id/devices", get(handlers::list_devices::<F>))
        .route(
            "/homes/:home_id/devices/:device_id",
            get(handlers::get_device_status::<F>),
        )
        .route(
            "/devices/:device_id/mode",
            post(handlers::set_device_mode::<F>),
        );

    Router::new()
        .route("/api/ping", get(handlers::ping))
        .nest("/api/bgh", bgh)
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(handlers::trace_request))
        .with_state(relay)
}

/// Serve the relay on an already bound listener until it fails.
pub async fn serve<F: GatewayFactory>(
    listener: TcpListener,
    relay: Arc<CommandRelay<F>>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }
    axum::serve(listener, router(relay)).await
}

/// Bind the configured address and serve a relay built from `factory`
/// and the `[relay]` section of `config`.
pub async fn run<F: GatewayFactory>(factory: F, config: &Config) -> Result<(), ServeError> {
    let addr: SocketAddr = config.relay.listen_addr()?;
    let relay = Arc::new(CommandRelay::from_config(
        factory,
        config.relay.to_relay_config(),
    ));
    let listener = TcpListener::bind(addr).await?;
    serve(listener, relay).await?;
    Ok(())
}
