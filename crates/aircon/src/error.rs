//! CLI error types with miette diagnostics.
//!
//! Maps relay, session, and configuration failures into user-facing
//! errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aircon_config::ConfigError;
use aircon_core::SessionError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the relay at {url}")]
    #[diagnostic(
        code(aircon::connection_failed),
        help(
            "Check that the relay is running and reachable.\n\
             URL: {url}\n\
             Try: aircon --relay http://127.0.0.1:4000 homes"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: aircon_api::Error,
    },

    #[error("No relay configured")]
    #[diagnostic(
        code(aircon::no_relay),
        help(
            "Pass --relay, set AIRCON_RELAY, or run: aircon config set-relay <URL>\n\
             Config file: {path}"
        )
    )]
    NoRelay { path: String },

    // ── Relay answers ────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(aircon::auth_failed),
        help(
            "The relay could not log in to the vendor cloud.\n\
             Check BGH_EMAIL and the stored password on the relay host.\n\
             Run: aircon config set-password --email <EMAIL>"
        )
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(aircon::not_found),
        help("Run: aircon {list_command} to see what is available")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(code(aircon::relay_error))]
    Relay { message: String, status: Option<u16> },

    // ── Session ──────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(
        code(aircon::no_selection),
        help("Run: aircon select <HOME> [DEVICE]")
    )]
    NoSelection(SessionError),

    #[error("{0}")]
    #[diagnostic(code(aircon::session))]
    Session(SessionError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aircon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(aircon::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(aircon::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::NoRelay { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::Session(SessionError::DeviceUnavailable { .. }) => {
                exit_code::NOT_FOUND
            }
            Self::Relay { status, .. } => match status {
                Some(400) => exit_code::USAGE,
                _ => exit_code::GENERAL,
            },
            Self::NoSelection(_)
            | Self::Validation { .. }
            | Self::Session(SessionError::ModeOff | SessionError::NoPendingChanges) => {
                exit_code::USAGE
            }
            Self::Session(_) | Self::Config(_) | Self::Io(_) | Self::Json(_) => exit_code::GENERAL,
        }
    }

    /// Classify a relay client failure. `list_command` is suggested when
    /// the relay reports a missing home or device.
    pub fn from_relay(err: aircon_api::Error, url: &str, list_command: &str) -> Self {
        if err.is_auth_failure() {
            return Self::AuthFailed {
                message: err.to_string(),
            };
        }
        if err.is_not_found() {
            return Self::NotFound {
                message: err.to_string(),
                list_command: list_command.into(),
            };
        }
        let unreachable = matches!(
            &err,
            aircon_api::Error::Transport(e) if e.is_connect() || e.is_timeout()
        );
        if unreachable {
            return Self::ConnectionFailed {
                url: url.into(),
                source: err,
            };
        }
        Self::Relay {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<aircon_api::Error> for CliError {
    fn from(err: aircon_api::Error) -> Self {
        Self::Relay {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoHomeSelected | SessionError::NoDeviceSelected => Self::NoSelection(err),
            other => Self::Session(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_statuses_pick_exit_codes() {
        let auth = aircon_api::Error::Rejected {
            status: 401,
            code: Some("AUTHENTICATION_ERROR".into()),
            message: "Vendor authentication failed while listing homes.".into(),
        };
        let err = CliError::from_relay(auth, "http://relay", "homes");
        assert_eq!(err.exit_code(), exit_code::AUTH);
        assert_eq!(
            err.to_string(),
            "Vendor authentication failed while listing homes."
        );

        let missing = aircon_api::Error::Rejected {
            status: 404,
            code: Some("NOT_FOUND".into()),
            message: "Device 9 not found in home 12.".into(),
        };
        let err = CliError::from_relay(missing, "http://relay", "devices");
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);

        let upstream = aircon_api::Error::Status { status: 502 };
        assert_eq!(
            CliError::from_relay(upstream, "http://relay", "homes").exit_code(),
            exit_code::GENERAL
        );
    }

    #[test]
    fn session_errors_pick_exit_codes() {
        assert_eq!(
            CliError::from(SessionError::NoDeviceSelected).exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(SessionError::DeviceUnavailable { device_id: 3 }).exit_code(),
            exit_code::NOT_FOUND
        );
        assert_eq!(
            CliError::from(SessionError::Backend {
                message: "socket hang up".into()
            })
            .exit_code(),
            exit_code::GENERAL
        );
    }
}
