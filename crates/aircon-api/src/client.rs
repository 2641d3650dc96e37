// Relay HTTP client
//
// Wraps `reqwest::Client` with URL construction under the relay's
// `/api/bgh` prefix and uniform handling of the relay's answers: JSON
// envelopes on success, `{code, message}` bodies on failure.

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    Device, DeviceResponse, DevicesResponse, Home, HomesResponse, ModeRequest, ModeResponse,
};
use crate::transport::TransportConfig;

const API_PREFIX: &str = "api/bgh";

/// HTTP client for the relay's device-control surface.
///
/// Every method returns the unwrapped payload -- the `{homes}` /
/// `{devices}` / `{device}` / `{result}` envelope is stripped before the
/// caller sees it.
pub struct RelayClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RelayClient {
    /// Create a client for the relay at `base_url` (e.g. `http://127.0.0.1:4000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The relay base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Operations ───────────────────────────────────────────────────

    /// `GET /homes`
    pub async fn list_homes(&self) -> Result<Vec<Home>, Error> {
        let url = self.api_url("homes")?;
        let envelope: HomesResponse = self.get(url).await?;
        Ok(envelope.homes)
    }

    /// `GET /homes/{homeId}/devices`, flattened into a list.
    pub async fn list_devices(&self, home_id: i64) -> Result<Vec<Device>, Error> {
        let url = self.api_url(&format!("homes/{home_id}/devices"))?;
        let envelope: DevicesResponse = self.get(url).await?;
        Ok(envelope.devices.into_values().collect())
    }

    /// `GET /homes/{homeId}/devices/{deviceId}`.
    ///
    /// Returns `None` when the relay answered successfully but without a
    /// device in the envelope.
    pub async fn get_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> Result<Option<Device>, Error> {
        let url = self.api_url(&format!("homes/{home_id}/devices/{device_id}"))?;
        let envelope: DeviceResponse = self.get(url).await?;
        Ok(envelope.device)
    }

    /// `POST /devices/{deviceId}/mode`
    pub async fn set_device_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> Result<Map<String, Value>, Error> {
        let url = self.api_url(&format!("devices/{device_id}/mode"))?;
        let envelope: ModeResponse = self.post(url, request).await?;
        Ok(envelope.result.unwrap_or_default())
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/bgh/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{API_PREFIX}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        Self::parse_response(resp).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        Self::parse_response(resp).await
    }

    /// Decode a relay answer.
    ///
    /// Failures with a JSON body surface the body's `message`; failures
    /// without one surface the status. Successful answers must be JSON.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let is_json = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !status.is_success() {
            if !is_json {
                return Err(Error::Status {
                    status: status.as_u16(),
                });
            }
            let body = resp.text().await?;
            trace!(%status, "relay error body: {body}");
            let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            return Err(Error::Rejected {
                status: status.as_u16(),
                code: parsed.get("code").and_then(Value::as_str).map(String::from),
                message: parsed
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Request rejected by the server")
                    .to_owned(),
            });
        }

        if !is_json {
            return Err(Error::UnexpectedResponse);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
