// Route handlers: validate, delegate to the command relay, wrap the
// answer in its envelope.

use std::sync::Arc;

use aircon_api::{DeviceResponse, DevicesResponse, GatewayFactory, HomesResponse, ModeResponse};
use aircon_core::CommandRelay;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{Value, json};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::validate::{parse_numeric_param, validate_mode_body};

type RelayState<F> = State<Arc<CommandRelay<F>>>;

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}

pub async fn not_found() -> ApiError {
    ApiError::route_not_found()
}

pub async fn list_homes<F: GatewayFactory>(
    State(relay): RelayState<F>,
) -> Result<Json<HomesResponse>, ApiError> {
    let homes = relay.list_homes().await?;
    Ok(Json(HomesResponse { homes }))
}

pub async fn list_devices<F: GatewayFactory>(
    State(relay): RelayState<F>,
    Path(home_id): Path<String>,
) -> Result<Json<DevicesResponse>, ApiError> {
    let home_id = parse_numeric_param("homeId", &home_id).inspect_err(rejected)?;
    let devices = relay.list_devices(home_id).await?;
    Ok(Json(DevicesResponse { devices }))
}

pub async fn get_device_status<F: GatewayFactory>(
    State(relay): RelayState<F>,
    Path((home_id, device_id)): Path<(String, String)>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let home_id = parse_numeric_param("homeId", &home_id).inspect_err(rejected)?;
    let device_id = parse_numeric_param("deviceId", &device_id).inspect_err(rejected)?;
    let device = relay.get_device_status(home_id, device_id).await?;
    Ok(Json(DeviceResponse {
        device: Some(device),
    }))
}

pub async fn set_device_mode<F: GatewayFactory>(
    State(relay): RelayState<F>,
    Path(device_id): Path<String>,
    body: Option<Json<Value>>,
) -> Result<Json<ModeResponse>, ApiError> {
    let device_id = parse_numeric_param("deviceId", &device_id).inspect_err(rejected)?;
    let request = validate_mode_body(body.as_ref().map(|Json(v)| v)).inspect_err(rejected)?;
    let result = relay.set_device_mode(device_id, &request).await?;
    Ok(Json(ModeResponse {
        result: Some(result),
    }))
}

fn rejected(err: &ApiError) {
    warn!(code = err.code(), "{}", err.message());
}

/// Run each request inside a span carrying a fresh request id.
pub async fn trace_request(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "request",
        %request_id,
        method = %request.method(),
        route = %request.uri().path(),
    );

    async move {
        let response = next.run(request).await;
        let status = response.status().as_u16();
        if response.status().is_server_error() {
            error!(status, "request failed");
        } else {
            debug!(status, "request completed");
        }
        response
    }
    .instrument(span)
    .await
}
