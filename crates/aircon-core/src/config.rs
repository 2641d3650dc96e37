// Relay configuration, as supplied by the environment or a config file.
//
// Values arrive unvalidated. `resolve()` turns them into the settings a
// gateway is built from, or a `Configuration` error.

use std::time::Duration;

use aircon_api::{DEFAULT_TIMEOUT, GatewaySettings};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Timeout override as it may appear in configuration: a number, or a
/// string from an environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutOverride {
    Millis(f64),
    Text(String),
}

impl TimeoutOverride {
    /// `Ok(None)` for an empty string, which counts as not set.
    fn to_millis(&self) -> Result<Option<f64>, RelayError> {
        let millis = match self {
            Self::Millis(value) => *value,
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<f64>().map_err(|_| invalid_timeout())?
            }
        };
        if millis.is_finite() && millis > 0.0 {
            Ok(Some(millis))
        } else {
            Err(invalid_timeout())
        }
    }
}

fn invalid_timeout() -> RelayError {
    RelayError::configuration("BGH_TIMEOUT_MS must be a positive number of milliseconds.")
}

/// Vendor account settings for the relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub timeout_ms: Option<TimeoutOverride>,
}

impl RelayConfig {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(SecretString::from(password.into())),
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, millis: f64) -> Self {
        self.timeout_ms = Some(TimeoutOverride::Millis(millis));
        self
    }

    /// Validate into gateway settings.
    pub fn resolve(&self) -> Result<GatewaySettings, RelayError> {
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                RelayError::configuration("BGH_EMAIL must be set to the vendor account email.")
            })?;

        let password = self
            .password
            .as_ref()
            .filter(|p| !p.expose_secret().is_empty())
            .ok_or_else(|| {
                RelayError::configuration("BGH_PASSWORD must be set to the vendor account password.")
            })?;

        let timeout = match &self.timeout_ms {
            Some(raw) => match raw.to_millis()? {
                Some(ms) => {
                    Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| invalid_timeout())?
                }
                None => DEFAULT_TIMEOUT,
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(GatewaySettings {
            email: email.to_owned(),
            password: password.clone(),
            timeout,
        })
    }
}
