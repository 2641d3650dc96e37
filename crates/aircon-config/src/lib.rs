//! Shared configuration for the aircon relay and CLI.
//!
//! One TOML file with a `[relay]` section (vendor account, timeout,
//! listen address) and a `[client]` section (relay URL), layered with
//! the conventional environment variables. Also owns the on-disk
//! location of the persisted home/device selection.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
    value::{Uncased, UncasedStr},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use aircon_core::{RelayConfig, SELECTION_KEY, TimeoutOverride};

const KEYRING_SERVICE: &str = "aircon";
const DEFAULT_LISTEN: &str = "127.0.0.1:4000";

/// Environment variables read on top of the config file.
const ENV_KEYS: [&str; 4] = ["BGH_EMAIL", "BGH_TIMEOUT_MS", "PORT", "AIRCON_RELAY"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub client: ClientSection,
}

/// Settings of the relay server.
#[derive(Debug, Deserialize, Serialize)]
pub struct RelaySection {
    /// Vendor account email.
    pub email: Option<String>,

    /// Vendor account password (plaintext; prefer keyring or env var).
    pub password: Option<String>,

    /// Vendor request timeout in milliseconds.
    pub timeout_ms: Option<TimeoutOverride>,

    /// Bind address.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Overrides the port of `listen`.
    pub port: Option<u16>,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            email: None,
            password: None,
            timeout_ms: None,
            listen: default_listen(),
            port: None,
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.into()
}

/// Settings of relay consumers (the CLI).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ClientSection {
    /// Base URL of the relay, e.g. `http://127.0.0.1:4000`.
    pub relay_url: Option<String>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "aircon", "aircon")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aircon");
    p
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Where the last home/device selection is kept.
pub fn selection_path() -> PathBuf {
    let file = format!("{SELECTION_KEY}.json");
    project_dirs().map_or_else(
        || dirs_fallback().join(&file),
        |dirs| dirs.data_dir().join(&file),
    )
}

// ── Config loading ──────────────────────────────────────────────────

fn env_key(key: &UncasedStr) -> Uncased<'_> {
    let mapped = if key == "BGH_EMAIL" {
        "relay.email"
    } else if key == "BGH_TIMEOUT_MS" {
        "relay.timeout_ms"
    } else if key == "PORT" {
        "relay.port"
    } else if key == "AIRCON_RELAY" {
        "client.relay_url"
    } else {
        return Uncased::from(key.as_str());
    };
    Uncased::from(mapped)
}

/// Load the full Config from `path` + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::raw().only(&ENV_KEYS).map(env_key));

    Ok(figment.extract()?)
}

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Credential resolution ───────────────────────────────────────────

impl RelaySection {
    /// Vendor password: `BGH_PASSWORD`, then the system keyring entry for
    /// the account email, then the plaintext config value.
    pub fn resolve_password(&self) -> Option<SecretString> {
        // 1. Env var
        if let Ok(pw) = std::env::var("BGH_PASSWORD") {
            return Some(SecretString::from(pw));
        }

        // 2. Keyring
        if let Some(email) = self.email.as_deref() {
            let stored = keyring::Entry::new(KEYRING_SERVICE, email)
                .and_then(|entry| entry.get_password());
            if let Ok(pw) = stored {
                return Some(SecretString::from(pw));
            }
        }

        // 3. Plaintext in config
        self.password.clone().map(SecretString::from)
    }

    /// Unvalidated relay settings; validation happens when the session
    /// cache first builds a gateway.
    pub fn to_relay_config(&self) -> RelayConfig {
        RelayConfig {
            email: self.email.clone(),
            password: self.resolve_password(),
            timeout_ms: self.timeout_ms.clone(),
        }
    }

    /// Bind address, with `port` applied.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let mut addr: SocketAddr = self.listen.parse().map_err(|_| ConfigError::Validation {
            field: "relay.listen".into(),
            reason: format!("expected host:port, got '{}'", self.listen),
        })?;
        if let Some(port) = self.port {
            addr.set_port(port);
        }
        Ok(addr)
    }
}

/// Store the vendor password in the system keyring.
pub fn store_password(email: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, email)?.set_password(password)?;
    Ok(())
}

impl ClientSection {
    /// The configured relay URL, if any.
    pub fn relay_url(&self) -> Result<Option<url::Url>, ConfigError> {
        self.relay_url
            .as_deref()
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::Validation {
                    field: "client.relay_url".into(),
                    reason: format!("invalid URL: {raw}"),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "4000");
            let config = load_config_from(&jail.directory().join("missing.toml"))
                .map_err(|e| format!("{e}"))?;
            assert_eq!(config.relay.listen, DEFAULT_LISTEN);
            assert_eq!(config.relay.email, None);
            assert_eq!(config.client.relay_url, None);
            assert_eq!(
                config.relay.listen_addr().unwrap(),
                "127.0.0.1:4000".parse::<SocketAddr>().unwrap()
            );
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [relay]
                email = "file@example.com"
                password = "from-file"
                timeout_ms = 4000
                listen = "0.0.0.0:8080"

                [client]
                relay_url = "http://10.0.0.2:4000"
                "#,
            )?;
            jail.set_env("BGH_EMAIL", "env@example.com");
            jail.set_env("BGH_TIMEOUT_MS", "2500");
            jail.set_env("PORT", "9000");
            jail.set_env("AIRCON_RELAY", "http://relay.local:4000");

            let config = load_config_from(Path::new("config.toml")).map_err(|e| format!("{e}"))?;
            assert_eq!(config.relay.email.as_deref(), Some("env@example.com"));
            assert_eq!(
                config.relay.listen_addr().unwrap(),
                "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
            );
            assert_eq!(
                config.client.relay_url().unwrap().unwrap().as_str(),
                "http://relay.local:4000/"
            );

            let settings = config.relay.to_relay_config().resolve().unwrap();
            assert_eq!(settings.email, "env@example.com");
            assert_eq!(settings.timeout.as_millis(), 2500);
            Ok(())
        });
    }

    #[test]
    fn password_env_wins() {
        Jail::expect_with(|jail| {
            jail.set_env("BGH_PASSWORD", "from-env");
            let section = RelaySection {
                email: Some("user@example.com".into()),
                password: Some("from-file".into()),
                ..RelaySection::default()
            };
            let password = section.resolve_password().unwrap();
            assert_eq!(secrecy::ExposeSecret::expose_secret(&password), "from-env");
            Ok(())
        });
    }

    #[test]
    fn invalid_listen_is_a_validation_error() {
        let section = RelaySection {
            listen: "localhost".into(),
            ..RelaySection::default()
        };
        assert!(matches!(
            section.listen_addr(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aircon").join("config.toml");
        let mut config = Config::default();
        config.client.relay_url = Some("http://127.0.0.1:4000".into());
        config.relay.email = Some("user@example.com".into());

        save_config_to(&config, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: Config = toml::from_str(&raw).unwrap();
        assert_eq!(loaded.client.relay_url, config.client.relay_url);
        assert_eq!(loaded.relay.email, config.relay.email);
        assert_eq!(loaded.relay.listen, DEFAULT_LISTEN);
    }

    #[test]
    fn selection_file_is_named_after_the_key() {
        assert!(
            selection_path()
                .to_string_lossy()
                .ends_with("ac-control-selection.json")
        );
    }
}
