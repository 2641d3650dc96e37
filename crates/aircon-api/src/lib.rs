//! Wire-level building blocks shared by every aircon component.
//!
//! - **[`models`]** — the JSON shapes that travel between the vendor
//!   gateway, the relay, and its callers (`Home`, `Device`, `ModeRequest`,
//!   response envelopes).
//! - **[`gateway`]** — the operation contract of the vendor's cloud client
//!   (`login`, list homes, list devices, device status, set mode) and the
//!   failure modes it may report. The relay depends on this contract only.
//! - **[`RelayClient`]** — async HTTP client for the relay's `/api/bgh`
//!   surface, used by client-side control sessions.

pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod transport;

pub use client::RelayClient;
pub use error::Error;
pub use gateway::{DEFAULT_TIMEOUT, GatewayError, GatewayFactory, GatewaySettings, VendorGateway};
pub use models::{
    Device, DeviceMap, DeviceResponse, DevicesResponse, ErrorBody, FanSetting, Home,
    HomesResponse, ModeRequest, ModeResponse,
};
pub use transport::{TlsMode, TransportConfig};
