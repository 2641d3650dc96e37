// ── Command relay ──
//
// The four device operations exposed to callers. Each one borrows the
// cached gateway, delegates, and reduces whatever goes wrong to a
// `RelayError`. Vendor payloads are decoded here, at the boundary, so
// nothing past this point handles raw JSON.

use aircon_api::{Device, DeviceMap, GatewayFactory, Home, ModeRequest, VendorGateway};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::session_cache::SessionCache;

pub struct CommandRelay<F: GatewayFactory> {
    cache: SessionCache<F>,
}

impl<F: GatewayFactory> CommandRelay<F> {
    pub fn new(cache: SessionCache<F>) -> Self {
        Self { cache }
    }

    /// Shorthand for a relay over a fresh [`SessionCache`].
    pub fn from_config(factory: F, config: RelayConfig) -> Self {
        Self::new(SessionCache::new(factory, config))
    }

    pub fn cache(&self) -> &SessionCache<F> {
        &self.cache
    }

    pub async fn list_homes(&self) -> Result<Vec<Home>, RelayError> {
        const CONTEXT: &str = "listing homes";
        let gateway = self.cache.get_client().await?;
        let payload = gateway
            .list_homes()
            .await
            .map_err(|e| failed(CONTEXT, e))?;
        let homes: Vec<Home> = decode(CONTEXT, payload)?;
        info!(count = homes.len(), "listed homes");
        Ok(homes)
    }

    pub async fn list_devices(&self, home_id: i64) -> Result<DeviceMap, RelayError> {
        const CONTEXT: &str = "listing devices";
        let gateway = self.cache.get_client().await?;
        let payload = gateway
            .list_devices(home_id)
            .await
            .map_err(|e| failed(CONTEXT, e))?;
        let devices: DeviceMap = decode(CONTEXT, payload)?;
        info!(home_id, count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Status of one device. A gateway answer without a device is
    /// reported as `NotFound`.
    pub async fn get_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> Result<Device, RelayError> {
        const CONTEXT: &str = "fetching device status";
        let gateway = self.cache.get_client().await?;
        let payload = gateway
            .get_device_status(home_id, device_id)
            .await
            .map_err(|e| failed(CONTEXT, e))?;
        let device: Option<Device> = decode(CONTEXT, payload)?;
        let device = device.ok_or_else(|| {
            RelayError::not_found(format!("Device {device_id} not found in home {home_id}."))
        })?;
        debug!(home_id, device_id, mode_id = ?device.mode_id, "fetched device status");
        Ok(device)
    }

    pub async fn set_device_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> Result<Map<String, Value>, RelayError> {
        const CONTEXT: &str = "updating device mode";
        let gateway = self.cache.get_client().await?;
        let payload = gateway
            .set_mode(device_id, request)
            .await
            .map_err(|e| failed(CONTEXT, e))?;
        let Value::Object(result) = payload else {
            return Err(RelayError::upstream(format!(
                "Vendor API request failed while {CONTEXT}. Expected an object in the response."
            )));
        };
        info!(
            device_id,
            mode = %request.mode,
            target = request.target_temperature,
            "device mode updated"
        );
        Ok(result)
    }
}

fn failed(context: &str, err: aircon_api::GatewayError) -> RelayError {
    let err = RelayError::from_gateway(context, err);
    error!(code = err.code(), "{err}");
    err
}

fn decode<T: DeserializeOwned>(context: &str, payload: Value) -> Result<T, RelayError> {
    serde_json::from_value(payload).map_err(|e| {
        error!(error = %e, "unexpected vendor payload while {context}");
        RelayError::Upstream {
            message: format!("Vendor API request failed while {context}. Unexpected response shape."),
            source: Some(Box::new(e)),
        }
    })
}
