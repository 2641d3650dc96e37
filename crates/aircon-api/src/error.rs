use thiserror::Error;

/// Error type for [`RelayClient`](crate::RelayClient) calls.
///
/// The `Display` output is meant to be shown to a user as-is: relay
/// rejections carry the relay's own message, everything else a short
/// description of what went wrong.
#[derive(Debug, Error)]
pub enum Error {
    // ── Relay ───────────────────────────────────────────────────────
    /// The relay answered with a structured `{code, message}` error body.
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Non-2xx answer without a JSON body.
    #[error("Request failed with status {status}")]
    Status { status: u16 },

    /// 2xx answer that isn't JSON.
    #[error("Unexpected response from server")]
    UnexpectedResponse,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status of the failed answer, if the relay answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } | Self::Status { status } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the relay reported a missing home or device.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the relay couldn't authenticate with the vendor.
    pub fn is_auth_failure(&self) -> bool {
        self.status() == Some(401)
    }

    /// The relay's error code (e.g. `"UPSTREAM_ERROR"`), if present.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Rejected { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
