// Data source of a control session.
//
// A session talks to the relay either over HTTP (`RelayClient`) or
// in-process (`CommandRelay`). Both reduce failures to one user-facing
// message.

use std::future::Future;

use aircon_api::{Device, GatewayFactory, Home, ModeRequest, RelayClient};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{RelayError, RelayErrorKind, SessionError};
use crate::relay::CommandRelay;

/// Failure of a backend call, already phrased for the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<aircon_api::Error> for BackendError {
    fn from(err: aircon_api::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<RelayError> for BackendError {
    fn from(err: RelayError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<BackendError> for SessionError {
    fn from(err: BackendError) -> Self {
        Self::Backend {
            message: err.message,
        }
    }
}

pub trait ControlBackend: Send + Sync {
    fn fetch_homes(&self) -> impl Future<Output = Result<Vec<Home>, BackendError>> + Send;

    /// Devices of a home, in no particular order.
    fn fetch_devices(
        &self,
        home_id: i64,
    ) -> impl Future<Output = Result<Vec<Device>, BackendError>> + Send;

    /// `Ok(None)` when the source answered without a device.
    fn fetch_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> impl Future<Output = Result<Option<Device>, BackendError>> + Send;

    fn update_device_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> impl Future<Output = Result<Map<String, Value>, BackendError>> + Send;
}

impl ControlBackend for RelayClient {
    async fn fetch_homes(&self) -> Result<Vec<Home>, BackendError> {
        Ok(self.list_homes().await?)
    }

    async fn fetch_devices(&self, home_id: i64) -> Result<Vec<Device>, BackendError> {
        Ok(self.list_devices(home_id).await?)
    }

    async fn fetch_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> Result<Option<Device>, BackendError> {
        Ok(self.get_device_status(home_id, device_id).await?)
    }

    async fn update_device_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> Result<Map<String, Value>, BackendError> {
        Ok(self.set_device_mode(device_id, request).await?)
    }
}

impl<F: GatewayFactory> ControlBackend for CommandRelay<F> {
    async fn fetch_homes(&self) -> Result<Vec<Home>, BackendError> {
        Ok(self.list_homes().await?)
    }

    async fn fetch_devices(&self, home_id: i64) -> Result<Vec<Device>, BackendError> {
        Ok(self.list_devices(home_id).await?.into_values().collect())
    }

    async fn fetch_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> Result<Option<Device>, BackendError> {
        match self.get_device_status(home_id, device_id).await {
            Ok(device) => Ok(Some(device)),
            Err(err) if err.kind() == RelayErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn update_device_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> Result<Map<String, Value>, BackendError> {
        Ok(self.set_device_mode(device_id, request).await?)
    }
}
