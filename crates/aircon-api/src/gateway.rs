// Vendor gateway contract
//
// The vendor's cloud client is an external collaborator. The relay only
// knows the five operations below and the three ways they can fail.
// Payloads come back as raw JSON; the relay validates their shape.

use std::future::Future;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;

use crate::models::ModeRequest;

/// Network timeout used when the configuration doesn't override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Failure reported by a [`VendorGateway`] operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The vendor rejected the account credentials or session token.
    #[error("{message}")]
    Authentication { message: String },

    /// The vendor answered, but with a failure status or an unusable body.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// Anything else: transport failures, lookups the client itself
    /// rejected ("Device 9 not found"), internal client errors.
    #[error("{message}")]
    Other { message: String },
}

impl GatewayError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
            status,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Validated settings handed to a [`GatewayFactory`].
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub email: String,
    pub password: SecretString,
    pub timeout: Duration,
}

/// Operation contract of the vendor's cloud client.
///
/// Implementations own authentication and transport; callers treat them
/// as opaque. All operations return the vendor payload as raw JSON.
pub trait VendorGateway: Send + Sync + 'static {
    /// Authenticate against the vendor with the settings the gateway was
    /// built from.
    fn login(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;

    fn list_homes(&self) -> impl Future<Output = Result<Value, GatewayError>> + Send;

    fn list_devices(
        &self,
        home_id: i64,
    ) -> impl Future<Output = Result<Value, GatewayError>> + Send;

    fn get_device_status(
        &self,
        home_id: i64,
        device_id: i64,
    ) -> impl Future<Output = Result<Value, GatewayError>> + Send;

    fn set_mode(
        &self,
        device_id: i64,
        request: &ModeRequest,
    ) -> impl Future<Output = Result<Value, GatewayError>> + Send;
}

/// Builds an unauthenticated gateway from validated settings.
pub trait GatewayFactory: Send + Sync + 'static {
    type Gateway: VendorGateway;

    fn build(&self, settings: GatewaySettings) -> Result<Self::Gateway, GatewayError>;
}
