// ── Core error types ──
//
// `RelayError` is the closed taxonomy every relay failure is reduced to.
// Callers of the relay see one of five kinds, a message naming the
// operation that failed, and never the raw gateway error (it is kept as
// `source()` for diagnostics only).
//
// `SessionError` covers the client side: rejected edits and failed
// fetches or submits of a control session.

use std::error::Error as StdError;

use aircon_api::GatewayError;
use thiserror::Error;

/// Relay failure, classified.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{message}")]
    Configuration { message: String },

    #[error("{message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    #[error("{message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },

    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
}

/// The kind of a [`RelayError`], with its wire code and HTTP status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayErrorKind {
    Configuration,
    Authentication,
    Upstream,
    NotFound,
    Unexpected,
}

impl RelayErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Upstream => "UPSTREAM_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Unexpected => "UNEXPECTED_ERROR",
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            Self::Configuration | Self::Unexpected => 500,
            Self::Authentication => 401,
            Self::Upstream => 502,
            Self::NotFound => 404,
        }
    }
}

impl RelayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> RelayErrorKind {
        match self {
            Self::Configuration { .. } => RelayErrorKind::Configuration,
            Self::Authentication { .. } => RelayErrorKind::Authentication,
            Self::Upstream { .. } => RelayErrorKind::Upstream,
            Self::NotFound { .. } => RelayErrorKind::NotFound,
            Self::Unexpected { .. } => RelayErrorKind::Unexpected,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Classify a gateway failure raised while performing `context`
    /// (e.g. "listing homes").
    ///
    /// Order: authentication signal, then vendor API failure, then any
    /// message mentioning "not found", then unexpected.
    pub fn from_gateway(context: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::Authentication { .. } => Self::Authentication {
                message: format!("Vendor authentication failed while {context}."),
                source: Some(Box::new(err)),
            },
            GatewayError::Api { ref message, .. } => Self::Upstream {
                message: format!("Vendor API request failed while {context}. {message}"),
                source: Some(Box::new(err)),
            },
            GatewayError::Other { ref message }
                if message.to_ascii_lowercase().contains("not found") =>
            {
                Self::NotFound {
                    message: message.clone(),
                    source: Some(Box::new(err)),
                }
            }
            GatewayError::Other { .. } => Self::Unexpected {
                message: format!("Unexpected error occurred while {context}."),
                source: Some(Box::new(err)),
            },
        }
    }
}

/// Failure of a control-session operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A command is already in flight")]
    Busy,

    #[error("No home selected")]
    NoHomeSelected,

    #[error("No device selected")]
    NoDeviceSelected,

    #[error("There are no changes to send")]
    NoPendingChanges,

    #[error("Use the power toggle to turn the unit off")]
    ModeOff,

    #[error("Device {device_id} did not report its status")]
    DeviceUnavailable { device_id: i64 },

    #[error("Device status was not returned after the update")]
    RefreshMissing,

    /// The data source failed; carries its user-facing message.
    #[error("{message}")]
    Backend { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_is_classified_first() {
        let err = RelayError::from_gateway(
            "listing homes",
            GatewayError::authentication("device not found"),
        );
        assert_eq!(err.kind(), RelayErrorKind::Authentication);
        assert_eq!(err.status_code(), 401);
        assert_eq!(
            err.to_string(),
            "Vendor authentication failed while listing homes."
        );
    }

    #[test]
    fn api_failure_is_upstream() {
        let err = RelayError::from_gateway(
            "listing devices",
            GatewayError::api(Some(503), "Service Unavailable"),
        );
        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert_eq!(err.status_code(), 502);
        assert_eq!(
            err.to_string(),
            "Vendor API request failed while listing devices. Service Unavailable"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn not_found_message_is_matched_case_insensitively() {
        let err = RelayError::from_gateway(
            "fetching device status",
            GatewayError::other("Device 9 NOT FOUND in home 12"),
        );
        assert_eq!(err.kind(), RelayErrorKind::NotFound);
        assert_eq!(err.to_string(), "Device 9 NOT FOUND in home 12");
    }

    #[test]
    fn anything_else_is_unexpected() {
        let err = RelayError::from_gateway("updating device mode", GatewayError::other("boom"));
        assert_eq!(err.kind(), RelayErrorKind::Unexpected);
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_string(),
            "Unexpected error occurred while updating device mode."
        );
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("boom"));
    }

    #[test]
    fn configuration_has_no_source() {
        let err = RelayError::configuration("missing email");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert_eq!(err.status_code(), 500);
        assert!(err.source().is_none());
    }
}
